//! The append-only chain.
//!
//! Every block links to the digest of its predecessor; the genesis block links
//! to the digest of the empty default block. [`Chain::validate`] recomputes all
//! links and Merkle roots and reports every mismatch it finds.

use crate::pool::{PoolStats, TransactionPool};
use authledger_core::{Block, CoreError, Hash, Transaction};
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One integrity problem found by [`Chain::violations`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("block {index}: prev_hash {found} does not match predecessor digest {expected}")]
    BrokenLink {
        index: usize,
        expected: Hash,
        found: Hash,
    },

    #[error("block {index}: stored merkle root {stored} but transactions hash to {computed}")]
    MerkleRootMismatch {
        index: usize,
        stored: Hash,
        computed: Hash,
    },

    #[error("block {index}: cannot be encoded: {reason}")]
    Unencodable { index: usize, reason: String },
}

impl Violation {
    /// Index of the offending block.
    pub fn index(&self) -> usize {
        match self {
            Violation::BrokenLink { index, .. }
            | Violation::MerkleRootMismatch { index, .. }
            | Violation::Unencodable { index, .. } => *index,
        }
    }
}

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain integrity violated ({} problem(s))", .0.len())]
    IntegrityViolation(Vec<Violation>),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Chain configuration.
#[derive(Debug, Clone, Default)]
pub struct ChainConfig {
    /// Cap on transactions per block. `None` drains the whole pool.
    pub max_block_transactions: Option<NonZeroUsize>,
}

/// An ordered block sequence plus its pending pool.
///
/// Always holds at least the genesis block.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    pool: TransactionPool,
    config: ChainConfig,
}

impl Chain {
    /// Create a chain holding only a fresh genesis block.
    pub fn new(config: ChainConfig) -> Result<Self> {
        let genesis = Block::genesis()?;
        info!(hash = %genesis.hash()?.short(), "created genesis block");
        Ok(Self {
            blocks: vec![genesis],
            pool: TransactionPool::new(),
            config,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Queue a transfer for the next block.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        value: f64,
    ) {
        self.submit(Transaction::new(sender, recipient, value));
    }

    /// Queue a prepared (possibly signed) transaction.
    pub fn submit(&mut self, tx: Transaction) {
        debug!(sender = %tx.sender, recipient = %tx.recipient, value = tx.value, "queued transaction");
        self.pool.add(tx);
    }

    /// Move pending transactions into a new block linked to the last one.
    ///
    /// The pool is only drained once the block has been built, so a failure
    /// leaves every pending transaction in place.
    pub fn create_block(&mut self) -> Result<&Block> {
        let prev_hash = self.last_block().hash()?;
        let limit = self.config.max_block_transactions.map(NonZeroUsize::get);
        let batch = self.pool.peek(limit).to_vec();
        let block = Block::new(prev_hash, batch)?;
        self.pool.take(block.tx_count());

        info!(
            index = self.blocks.len(),
            txs = block.tx_count(),
            root = %block.merkle_root.short(),
            "appended block"
        );
        self.blocks.push(block);
        Ok(self.last_block())
    }

    /// Every integrity problem in the chain, in block order.
    pub fn violations(&self) -> Vec<Violation> {
        let mut found = Vec::new();
        let mut expected_prev = match Block::default().hash() {
            Ok(hash) => Some(hash),
            Err(err) => {
                found.push(Violation::Unencodable {
                    index: 0,
                    reason: err.to_string(),
                });
                None
            }
        };

        for (index, block) in self.blocks.iter().enumerate() {
            if let Some(expected) = expected_prev {
                if block.prev_hash != expected {
                    found.push(Violation::BrokenLink {
                        index,
                        expected,
                        found: block.prev_hash,
                    });
                }
            }

            let encoded = block
                .compute_merkle_root()
                .and_then(|computed| Ok((computed, block.hash()?)));
            match encoded {
                Ok((computed, hash)) => {
                    if computed != block.merkle_root {
                        found.push(Violation::MerkleRootMismatch {
                            index,
                            stored: block.merkle_root,
                            computed,
                        });
                    }
                    expected_prev = Some(hash);
                }
                Err(err) => {
                    found.push(Violation::Unencodable {
                        index,
                        reason: err.to_string(),
                    });
                    expected_prev = None;
                }
            }
        }

        found
    }

    /// Check all hash links and Merkle roots.
    pub fn validate(&self) -> Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            return Ok(());
        }
        for violation in &violations {
            warn!(%violation, "chain integrity violation");
        }
        Err(ChainError::IntegrityViolation(violations))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Mutable access to a stored block, for signing in place.
    ///
    /// Edits that touch hashed fields show up in [`Chain::validate`].
    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub fn last_block(&self) -> &Block {
        // Never empty: genesis is created in `new`.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn last_block_mut(&mut self) -> &mut Block {
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Height of the last block (genesis is 0).
    pub fn height(&self) -> u64 {
        (self.blocks.len() - 1) as u64
    }

    pub fn pending(&self) -> &[Transaction] {
        self.pool.pending()
    }

    pub fn stats(&self) -> Result<ChainStats> {
        Ok(ChainStats {
            height: self.height(),
            latest_block_hash: self.last_block().hash()?,
            latest_timestamp: self.last_block().timestamp,
            pool: self.pool.stats(),
        })
    }
}

/// Chain statistics.
#[derive(Debug, Clone)]
pub struct ChainStats {
    pub height: u64,
    pub latest_block_hash: Hash,
    /// Unix nanoseconds.
    pub latest_timestamp: u64,
    pub pool: PoolStats,
}

/// A chain shared between threads.
///
/// Each call holds the lock for its whole duration, so a block drains the pool
/// atomically with respect to concurrent submitters: every transaction lands
/// in exactly one block or stays pending.
#[derive(Debug, Clone)]
pub struct SharedChain {
    inner: Arc<Mutex<Chain>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    pub fn add_transaction(&self, sender: impl Into<String>, recipient: impl Into<String>, value: f64) {
        self.inner.lock().add_transaction(sender, recipient, value);
    }

    pub fn submit(&self, tx: Transaction) {
        self.inner.lock().submit(tx);
    }

    /// Create a block and return a copy of it.
    pub fn create_block(&self) -> Result<Block> {
        self.inner.lock().create_block().cloned()
    }

    pub fn validate(&self) -> Result<()> {
        self.inner.lock().validate()
    }

    /// Run `f` with exclusive access to the chain.
    pub fn with<R>(&self, f: impl FnOnce(&mut Chain) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
