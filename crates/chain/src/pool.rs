//! Pending transaction pool.
//!
//! Transactions wait here, in submission order, until the next block takes
//! them. No balance or duplicate checks are made.

use authledger_core::Transaction;
use std::collections::HashSet;

/// FIFO pool of pending transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction.
    pub fn add(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Pending transactions in submission order.
    pub fn pending(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The first `limit` pending transactions, or all of them.
    pub fn peek(&self, limit: Option<usize>) -> &[Transaction] {
        let n = limit.map_or(self.len(), |l| l.min(self.len()));
        &self.transactions[..n]
    }

    /// Remove and return the first `count` transactions.
    pub fn take(&mut self, count: usize) -> Vec<Transaction> {
        let count = count.min(self.len());
        self.transactions.drain(..count).collect()
    }

    /// Remove and return everything.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    pub fn stats(&self) -> PoolStats {
        let senders: HashSet<&str> = self.transactions.iter().map(|t| t.sender.as_str()).collect();
        PoolStats {
            total_transactions: self.len(),
            unique_senders: senders.len(),
            total_value: self.transactions.iter().map(|t| t.value).sum(),
        }
    }
}

/// Pool statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolStats {
    pub total_transactions: usize,
    pub unique_senders: usize,
    /// Sum of pending values.
    pub total_value: f64,
}
