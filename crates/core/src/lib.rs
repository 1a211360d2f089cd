//! Core ledger primitives for authledger.
//!
//! This crate provides the integrity building blocks of the ledger:
//! - Blake3 digests
//! - Merkle trees with side-tagged membership proofs
//! - Transactions and blocks with a fixed canonical encoding
//! - The ed25519 signing capability used by transaction signatures

pub mod block;
pub mod crypto;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::Block;
pub use crypto::{Address, CryptoError, Keypair, PublicKey, Signature};
pub use error::{CoreError, Result};
pub use hash::{hash, hash_concat, hash_pair, Hash, H256};
pub use merkle::{merkle_root, verify_proof, MerkleNode, MerkleProof, MerkleTree, NodeId, ProofStep, Side};
pub use transaction::Transaction;
