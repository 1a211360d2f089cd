//! Blocks and their canonical digest.
//!
//! # Canonical encoding
//!
//! [`Block::hash`] is the digest of the bincode encoding (little-endian
//! fixed-width integers, `u64` length prefixes) of the following fields, in
//! this order:
//!
//! 1. `timestamp` as `u64` nanoseconds since the Unix epoch
//! 2. `prev_hash` as 32 raw bytes
//! 3. `merkle_root` as 32 raw bytes
//! 4. `transactions` as a length-prefixed sequence of
//!    `(sender, recipient, value: f64)`
//!
//! The authority signature is not part of the digest. Reordering these fields
//! changes every block hash and breaks linkage with existing chains.

use crate::error::Result;
use crate::hash::{hash, Hash};
use crate::merkle::{merkle_root, MerkleTree};
use crate::transaction::{CanonicalTransaction, Transaction};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// One ledger entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Creation time, Unix nanoseconds.
    pub timestamp: u64,
    /// Digest of the previous block.
    pub prev_hash: Hash,
    pub transactions: Vec<Transaction>,
    /// Merkle root over the transaction digests.
    pub merkle_root: Hash,
    /// Authority signature, hex encoded. `None` until signed.
    pub signature: Option<String>,
}

#[derive(Serialize)]
struct CanonicalBlock<'a> {
    timestamp: u64,
    prev_hash: &'a Hash,
    merkle_root: &'a Hash,
    transactions: Vec<CanonicalTransaction<'a>>,
}

impl Block {
    /// Create an unsigned block stamped with the current time.
    pub fn new(prev_hash: Hash, transactions: Vec<Transaction>) -> Result<Self> {
        Self::with_timestamp(Self::current_timestamp(), prev_hash, transactions)
    }

    /// Create an unsigned block with an explicit timestamp.
    pub fn with_timestamp(
        timestamp: u64,
        prev_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Result<Self> {
        let merkle_root = Self::build_tree(&transactions)?.root();
        debug!(
            txs = transactions.len(),
            prev = %prev_hash.short(),
            root = %merkle_root.short(),
            "built block"
        );

        Ok(Self {
            timestamp,
            prev_hash,
            transactions,
            merkle_root,
            signature: None,
        })
    }

    /// The first block of a chain. Its previous digest is the hash of the
    /// empty default block.
    pub fn genesis() -> Result<Self> {
        Self::new(Self::default().hash()?, Vec::new())
    }

    /// Current Unix time in nanoseconds.
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    }

    /// Canonical encoding, see the module docs.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let canonical = CanonicalBlock {
            timestamp: self.timestamp,
            prev_hash: &self.prev_hash,
            merkle_root: &self.merkle_root,
            transactions: self.transactions.iter().map(CanonicalTransaction::from).collect(),
        };
        Ok(bincode::serialize(&canonical)?)
    }

    /// Block digest, used as the next block's `prev_hash`.
    pub fn hash(&self) -> Result<Hash> {
        Ok(hash(&self.canonical_bytes()?))
    }

    fn build_tree(transactions: &[Transaction]) -> Result<MerkleTree> {
        let leaves = Self::leaf_hashes(transactions)?;
        Ok(MerkleTree::build(&leaves))
    }

    fn leaf_hashes(transactions: &[Transaction]) -> Result<Vec<Hash>> {
        transactions.iter().map(Transaction::hash).collect()
    }

    /// Rebuild the full tree from the current transaction list, for proofs.
    pub fn merkle_tree(&self) -> Result<MerkleTree> {
        Self::build_tree(&self.transactions)
    }

    /// Recompute the Merkle root from the current transaction list.
    pub fn compute_merkle_root(&self) -> Result<Hash> {
        Ok(merkle_root(&Self::leaf_hashes(&self.transactions)?))
    }

    /// Whether the stored root still matches the transactions.
    pub fn verify_merkle_root(&self) -> Result<bool> {
        Ok(self.compute_merkle_root()? == self.merkle_root)
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_pair;

    fn sample_txs() -> Vec<Transaction> {
        vec![
            Transaction::new("A", "B", 1.0),
            Transaction::new("C", "D", 2.0),
        ]
    }

    #[test]
    fn test_new_block_is_unsigned_with_root() {
        let txs = sample_txs();
        let block = Block::new(Hash::ZERO, txs.clone()).unwrap();

        let expected = hash_pair(&txs[0].hash().unwrap(), &txs[1].hash().unwrap());
        assert_eq!(block.merkle_root, expected);
        assert!(!block.is_signed());
        assert_eq!(block.tx_count(), 2);
        assert!(block.timestamp > 0);
    }

    #[test]
    fn test_empty_block_has_zero_root() {
        let block = Block::new(Hash::ZERO, vec![]).unwrap();
        assert_eq!(block.merkle_root, Hash::ZERO);
        assert!(block.verify_merkle_root().unwrap());
    }

    #[test]
    fn test_single_tx_root_is_tx_hash() {
        let tx = Transaction::new("A", "B", 1.0);
        let block = Block::new(Hash::ZERO, vec![tx.clone()]).unwrap();
        assert_eq!(block.merkle_root, tx.hash().unwrap());
    }

    #[test]
    fn test_genesis_links_to_default_block() {
        let genesis = Block::genesis().unwrap();
        assert_eq!(genesis.prev_hash, Block::default().hash().unwrap());
        assert!(genesis.transactions.is_empty());
    }

    #[test]
    fn test_hash_deterministic() {
        let block = Block::with_timestamp(42, Hash::ZERO, sample_txs()).unwrap();
        let again = Block::with_timestamp(42, Hash::ZERO, sample_txs()).unwrap();
        assert_eq!(block.hash().unwrap(), again.hash().unwrap());
    }

    #[test]
    fn test_hash_covers_each_field() {
        let block = Block::with_timestamp(42, Hash::ZERO, sample_txs()).unwrap();
        let base = block.hash().unwrap();

        let mut changed = block.clone();
        changed.timestamp += 1;
        assert_ne!(changed.hash().unwrap(), base);

        let mut changed = block.clone();
        changed.prev_hash = hash(b"other parent");
        assert_ne!(changed.hash().unwrap(), base);

        let mut changed = block.clone();
        changed.merkle_root = Hash::ZERO;
        assert_ne!(changed.hash().unwrap(), base);

        let mut changed = block.clone();
        changed.transactions[0].value = 9.0;
        assert_ne!(changed.hash().unwrap(), base);
    }

    #[test]
    fn test_hash_excludes_signature() {
        let mut block = Block::with_timestamp(42, Hash::ZERO, sample_txs()).unwrap();
        let before = block.hash().unwrap();
        block.signature = Some("deadbeef".into());
        assert_eq!(block.hash().unwrap(), before);
    }

    #[test]
    fn test_canonical_layout_starts_with_timestamp() {
        let block = Block::with_timestamp(0x0102, hash(b"p"), vec![]).unwrap();
        let bytes = block.canonical_bytes().unwrap();

        assert_eq!(&bytes[..8], &0x0102u64.to_le_bytes());
        assert_eq!(&bytes[8..40], hash(b"p").as_bytes());
        assert_eq!(&bytes[40..72], Hash::ZERO.as_bytes());
        assert_eq!(&bytes[72..80], &0u64.to_le_bytes());
        assert_eq!(bytes.len(), 80);
    }

    #[test]
    fn test_tampering_detected_by_root_check() {
        let mut block = Block::new(Hash::ZERO, sample_txs()).unwrap();
        assert!(block.verify_merkle_root().unwrap());

        block.transactions[1].value = 200.0;
        assert!(!block.verify_merkle_root().unwrap());
    }

    #[test]
    fn test_merkle_tree_proof_for_block_tx() {
        let block = Block::new(Hash::ZERO, sample_txs()).unwrap();
        let tree = block.merkle_tree().unwrap();
        let leaf = block.transactions[0].hash().unwrap();

        let proof = tree.generate_proof(&leaf).unwrap();
        assert!(proof.verify(&block.merkle_root));
    }
}
