//! Proof of Authority block signing for authledger.
//!
//! This crate provides:
//! - An allow-list of signing authorities with per-entry revocation
//! - Deterministic block signing and verification
//! - A lock-guarded handle for sharing the registry between threads
//!
//! # Example
//!
//! ```rust
//! use authledger_consensus::{AuthorityRegistry, PoaConfig};
//! use authledger_core::{Block, Transaction};
//!
//! let mut registry =
//!     AuthorityRegistry::with_authorities(["authority1", "authority2"], PoaConfig::default());
//!
//! let genesis = Block::genesis().unwrap();
//! let mut block =
//!     Block::new(genesis.hash().unwrap(), vec![Transaction::new("A", "B", 1.0)]).unwrap();
//!
//! registry.sign_block("authority1", &mut block).unwrap();
//! assert!(registry.verify_block(&block, "authority1"));
//!
//! registry.revoke_authority("authority1");
//! assert!(!registry.verify_block(&block, "authority1"));
//! ```

pub mod poa;

// Re-export commonly used types
pub use poa::{
    Authority, AuthorityId, AuthorityRegistry, ConsensusError, PoaConfig, SharedAuthorityRegistry,
    SignatureScope,
};
