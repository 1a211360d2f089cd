//! Property-based tests for Merkle construction and proofs.

use authledger_core::{hash, merkle_root, verify_proof, Hash, MerkleTree, Side};
use proptest::prelude::*;

fn leaves(seeds: &[u32]) -> Vec<Hash> {
    seeds.iter().map(|s| hash(&s.to_le_bytes())).collect()
}

proptest! {
    #[test]
    fn every_leaf_has_a_valid_proof(seeds in prop::collection::vec(any::<u32>(), 1..64)) {
        let hashes = leaves(&seeds);
        let tree = MerkleTree::build(&hashes);
        let root = tree.root();

        for (i, leaf) in hashes.iter().enumerate() {
            let proof = tree.proof_at(i).unwrap();
            prop_assert_eq!(proof.leaf, *leaf);
            prop_assert!(verify_proof(leaf, &proof.steps, &root));

            let by_digest = tree.generate_proof(leaf).unwrap();
            prop_assert!(by_digest.verify(&root));
        }
    }

    #[test]
    fn arena_root_matches_flat_root(seeds in prop::collection::vec(any::<u32>(), 0..64)) {
        let hashes = leaves(&seeds);
        prop_assert_eq!(MerkleTree::build(&hashes).root(), merkle_root(&hashes));
    }

    #[test]
    fn proof_depth_is_ceil_log2(seeds in prop::collection::vec(any::<u32>(), 1..64)) {
        let hashes = leaves(&seeds);
        let tree = MerkleTree::build(&hashes);
        let expected = (hashes.len() as f64).log2().ceil() as usize;
        prop_assert_eq!(tree.proof_at(0).unwrap().len(), expected);
    }

    #[test]
    fn flipping_any_side_breaks_the_proof(
        seeds in prop::collection::hash_set(any::<u32>(), 2..32),
        pick in any::<prop::sample::Index>(),
    ) {
        let seeds: Vec<u32> = seeds.into_iter().collect();
        let hashes = leaves(&seeds);
        let tree = MerkleTree::build(&hashes);
        let i = pick.index(hashes.len());
        let mut proof = tree.proof_at(i).unwrap();

        // A self-paired step is symmetric, so only flip a step whose sibling
        // differs from the running value.
        let mut current = proof.leaf;
        let mut target = None;
        for (n, step) in proof.steps.iter().enumerate() {
            if step.sibling != current {
                target = Some(n);
                break;
            }
            current = step.apply(&current);
        }

        if let Some(n) = target {
            let step = &mut proof.steps[n];
            step.side = match step.side {
                Side::Left => Side::Right,
                Side::Right => Side::Left,
            };
            prop_assert!(!proof.verify(&tree.root()));
        }
    }
}
