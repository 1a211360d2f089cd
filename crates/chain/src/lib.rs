//! Append-only chain and transaction pool for authledger.
//!
//! This crate links blocks into a verifiable sequence:
//! - **Pool**: pending transactions in submission order
//! - **Chain**: block creation, hash linkage and integrity validation
//! - **SharedChain**: a mutex-guarded handle for concurrent submitters
//!
//! # Example
//!
//! ```rust
//! use authledger_chain::{Chain, ChainConfig};
//!
//! let mut chain = Chain::new(ChainConfig::default()).unwrap();
//! chain.add_transaction("A", "B", 1.0);
//! chain.add_transaction("C", "D", 2.0);
//! chain.create_block().unwrap();
//!
//! assert_eq!(chain.len(), 2);
//! assert!(chain.validate().is_ok());
//! ```

pub mod blockchain;
pub mod pool;

// Re-export commonly used types
pub use blockchain::{Chain, ChainConfig, ChainError, ChainStats, SharedChain, Violation};
pub use pool::{PoolStats, TransactionPool};
