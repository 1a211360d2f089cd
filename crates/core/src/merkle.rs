//! Binary Merkle tree over transaction digests.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Each node
//! records its parent, so a proof is a walk of `O(log n)` back-references
//! from the leaf to the root instead of a search from the top.
//!
//! An odd level is padded by pairing its last node *with itself*: the parent
//! holds the same [`NodeId`] as both children. No copy of the node is made.

use crate::error::{CoreError, Result};
use crate::hash::{hash_pair, Hash};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Index of a node inside [`MerkleTree::nodes`].
pub type NodeId = usize;

/// One node of the tree. Leaves have no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleNode {
    pub hash: Hash,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub parent: Option<NodeId>,
}

impl MerkleNode {
    fn leaf(hash: Hash) -> Self {
        Self {
            hash,
            left: None,
            right: None,
            parent: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Which side of the combination the sibling occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Sibling was the left child: next value is `H(sibling ‖ current)`.
    Left,
    /// Sibling was the right child: next value is `H(current ‖ sibling)`.
    Right,
}

/// One level of a membership proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Hash,
    pub side: Side,
}

impl ProofStep {
    /// Combine `current` with this step's sibling.
    pub fn apply(&self, current: &Hash) -> Hash {
        match self.side {
            Side::Left => hash_pair(&self.sibling, current),
            Side::Right => hash_pair(current, &self.sibling),
        }
    }
}

/// A membership proof for a single leaf, ordered leaf to root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Hash,
    /// Sibling digests with their side, from the leaf level upward.
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Number of levels between the leaf and the root.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sibling digests without their position tags.
    pub fn siblings(&self) -> Vec<Hash> {
        self.steps.iter().map(|s| s.sibling).collect()
    }

    /// Check this proof against an expected root.
    pub fn verify(&self, expected_root: &Hash) -> bool {
        verify_proof(&self.leaf, &self.steps, expected_root)
    }
}

/// A Merkle tree with every constructed node retained for proof queries.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    nodes: Vec<MerkleNode>,
    leaves: Vec<NodeId>,
    root: Option<NodeId>,
}

impl MerkleTree {
    /// Build a tree over `leaves` in order.
    ///
    /// With no leaves the tree is empty and its root is [`Hash::ZERO`]. With a
    /// single leaf the root is that leaf's digest; nothing is combined.
    pub fn build(leaves: &[Hash]) -> Self {
        if leaves.is_empty() {
            return Self::default();
        }

        let mut nodes: Vec<MerkleNode> = Vec::with_capacity(leaves.len() * 2);
        nodes.extend(leaves.iter().copied().map(MerkleNode::leaf));
        let leaf_ids: Vec<NodeId> = (0..leaves.len()).collect();

        let mut level = leaf_ids.clone();
        while level.len() > 1 {
            if level.len() % 2 == 1 {
                let last = level[level.len() - 1];
                level.push(last);
            }

            let mut next = Vec::with_capacity(level.len() / 2);
            for pair in level.chunks_exact(2) {
                let (left, right) = (pair[0], pair[1]);
                let id = nodes.len();
                let hash = hash_pair(&nodes[left].hash, &nodes[right].hash);
                nodes.push(MerkleNode {
                    hash,
                    left: Some(left),
                    right: Some(right),
                    parent: None,
                });
                nodes[left].parent = Some(id);
                nodes[right].parent = Some(id);
                next.push(id);
            }
            level = next;
        }

        Self {
            nodes,
            leaves: leaf_ids,
            root: level.first().copied(),
        }
    }

    /// Root digest, or [`Hash::ZERO`] for an empty tree.
    pub fn root(&self) -> Hash {
        self.root.map(|id| self.nodes[id].hash).unwrap_or(Hash::ZERO)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Total nodes constructed across all levels.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The flat node registry.
    pub fn nodes(&self) -> &[MerkleNode] {
        &self.nodes
    }

    /// Leaf digests in insertion order.
    pub fn leaves(&self) -> impl Iterator<Item = &Hash> + '_ {
        self.leaves.iter().map(|&id| &self.nodes[id].hash)
    }

    /// Build a proof for the first leaf whose digest equals `target`.
    pub fn generate_proof(&self, target: &Hash) -> Result<MerkleProof> {
        let leaf = self
            .leaves
            .iter()
            .copied()
            .find(|&id| self.nodes[id].hash == *target)
            .ok_or(CoreError::NotFound(*target))?;

        let proof = self.proof_from(leaf);
        debug!(leaf = %target.short(), depth = proof.len(), "generated merkle proof");
        Ok(proof)
    }

    /// Build a proof for the leaf at `index`. Useful when digests repeat.
    pub fn proof_at(&self, index: usize) -> Option<MerkleProof> {
        self.leaves.get(index).map(|&id| self.proof_from(id))
    }

    fn proof_from(&self, leaf: NodeId) -> MerkleProof {
        let mut steps = Vec::new();
        let mut current = leaf;

        while let Some(parent_id) = self.nodes[current].parent {
            let parent = &self.nodes[parent_id];
            let (Some(left), Some(right)) = (parent.left, parent.right) else {
                break;
            };

            // A self-paired node is its own right sibling.
            let step = if left == current {
                ProofStep {
                    sibling: self.nodes[right].hash,
                    side: Side::Right,
                }
            } else {
                ProofStep {
                    sibling: self.nodes[left].hash,
                    side: Side::Left,
                }
            };
            steps.push(step);
            current = parent_id;
        }

        MerkleProof {
            leaf: self.nodes[leaf].hash,
            steps,
        }
    }

    /// Verify a proof against this tree's root.
    pub fn verify(&self, proof: &MerkleProof) -> bool {
        proof.verify(&self.root())
    }
}

/// Fold `leaf` through `steps` and compare with `expected_root`.
pub fn verify_proof(leaf: &Hash, steps: &[ProofStep], expected_root: &Hash) -> bool {
    let computed = steps.iter().fold(*leaf, |current, step| step.apply(&current));
    computed == *expected_root
}

/// Root of the tree over `hashes` without retaining nodes.
///
/// Always equal to `MerkleTree::build(hashes).root()`.
pub fn merkle_root(hashes: &[Hash]) -> Hash {
    match hashes.len() {
        0 => return Hash::ZERO,
        1 => return hashes[0],
        _ => {}
    }

    let mut level: Vec<Hash> = hashes.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|chunk| hash_pair(&chunk[0], chunk.get(1).unwrap_or(&chunk[0])))
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    fn make_hashes(n: usize) -> Vec<Hash> {
        (0..n).map(|i| hash(&[i as u8])).collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::build(&[]);
        assert_eq!(tree.root(), Hash::ZERO);
        assert_eq!(tree.node_count(), 0);
        assert!(matches!(
            tree.generate_proof(&hash(b"x")),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_single_leaf_is_root() {
        let hashes = make_hashes(1);
        let tree = MerkleTree::build(&hashes);
        assert_eq!(tree.root(), hashes[0]);
        assert_eq!(tree.node_count(), 1);

        let proof = tree.generate_proof(&hashes[0]).unwrap();
        assert!(proof.is_empty());
        assert!(tree.verify(&proof));
    }

    #[test]
    fn test_two_leaves() {
        let hashes = make_hashes(2);
        let tree = MerkleTree::build(&hashes);
        assert_eq!(tree.root(), hash_pair(&hashes[0], &hashes[1]));

        let proof = tree.generate_proof(&hashes[0]).unwrap();
        assert_eq!(
            proof.steps,
            vec![ProofStep {
                sibling: hashes[1],
                side: Side::Right
            }]
        );

        let proof = tree.generate_proof(&hashes[1]).unwrap();
        assert_eq!(
            proof.steps,
            vec![ProofStep {
                sibling: hashes[0],
                side: Side::Left
            }]
        );
    }

    #[test]
    fn test_odd_level_pairs_node_with_itself() {
        let hashes = make_hashes(3);
        let tree = MerkleTree::build(&hashes);

        // 3 leaves, 2 parents, 1 root. The padded third leaf is not copied.
        assert_eq!(tree.node_count(), 6);
        let padded_parent = &tree.nodes()[4];
        assert_eq!(padded_parent.left, Some(2));
        assert_eq!(padded_parent.right, Some(2));

        let expected = hash_pair(
            &hash_pair(&hashes[0], &hashes[1]),
            &hash_pair(&hashes[2], &hashes[2]),
        );
        assert_eq!(tree.root(), expected);
        assert_ne!(tree.root(), merkle_root(&hashes[..2]));
        assert_ne!(tree.root(), merkle_root(&[hashes[0], hashes[2]]));
        assert_ne!(tree.root(), merkle_root(&[hashes[1], hashes[2]]));
    }

    #[test]
    fn test_self_paired_leaf_proof() {
        let hashes = make_hashes(3);
        let tree = MerkleTree::build(&hashes);
        let proof = tree.generate_proof(&hashes[2]).unwrap();

        assert_eq!(proof.steps[0].sibling, hashes[2]);
        assert_eq!(proof.steps[0].side, Side::Right);
        assert!(tree.verify(&proof));
    }

    #[test]
    fn test_root_matches_flat_computation() {
        for n in 0..20 {
            let hashes = make_hashes(n);
            assert_eq!(MerkleTree::build(&hashes).root(), merkle_root(&hashes), "n = {n}");
        }
    }

    #[test]
    fn test_root_deterministic_and_order_sensitive() {
        let hashes = make_hashes(6);
        assert_eq!(MerkleTree::build(&hashes).root(), MerkleTree::build(&hashes).root());

        let mut reversed = hashes.clone();
        reversed.reverse();
        assert_ne!(merkle_root(&hashes), merkle_root(&reversed));
    }

    #[test]
    fn test_proofs_for_every_leaf() {
        for n in [1usize, 2, 3, 5, 8] {
            let hashes = make_hashes(n);
            let tree = MerkleTree::build(&hashes);
            let root = tree.root();

            for leaf in &hashes {
                let proof = tree.generate_proof(leaf).unwrap();
                assert!(verify_proof(leaf, &proof.steps, &root), "n = {n}");
            }

            let absent = hash(b"not in the tree");
            assert!(tree.generate_proof(&absent).is_err());
        }
    }

    #[test]
    fn test_proof_rejects_wrong_root_and_flipped_side() {
        let hashes = make_hashes(4);
        let tree = MerkleTree::build(&hashes);
        let proof = tree.generate_proof(&hashes[1]).unwrap();

        assert!(!proof.verify(&hash(b"wrong")));

        let mut flipped = proof.clone();
        flipped.steps[0].side = match flipped.steps[0].side {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        assert!(!flipped.verify(&tree.root()));
    }

    #[test]
    fn test_proof_at_index() {
        let hashes = make_hashes(5);
        let tree = MerkleTree::build(&hashes);
        assert_eq!(tree.proof_at(3), tree.generate_proof(&hashes[3]).ok());
        assert!(tree.proof_at(5).is_none());
    }

    #[test]
    fn test_duplicate_leaves_resolve_to_first() {
        let a = hash(b"a");
        let b = hash(b"b");
        let tree = MerkleTree::build(&[a, b, a]);

        let proof = tree.generate_proof(&a).unwrap();
        assert_eq!(Some(proof.clone()), tree.proof_at(0));
        assert!(tree.verify(&proof));
        assert!(tree.verify(&tree.proof_at(2).unwrap()));
    }

    #[test]
    fn test_internal_digests_are_not_provable() {
        let hashes = make_hashes(4);
        let tree = MerkleTree::build(&hashes);
        assert_eq!(tree.nodes().iter().filter(|n| n.is_leaf()).count(), 4);

        let root = tree.root();
        assert!(matches!(
            tree.generate_proof(&root),
            Err(CoreError::NotFound(h)) if h == root
        ));
    }

    #[test]
    fn test_proof_depth_is_logarithmic() {
        let hashes = make_hashes(8);
        let tree = MerkleTree::build(&hashes);
        let proof = tree.generate_proof(&hashes[5]).unwrap();
        assert_eq!(proof.len(), 3);
        assert_eq!(tree.leaves().count(), 8);
    }
}
