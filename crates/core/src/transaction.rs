//! Value transfers between two parties.

use crate::crypto::{CryptoError, Keypair, PublicKey, Signature};
use crate::error::Result;
use crate::hash::{hash, Hash};
use serde::{Deserialize, Serialize};

/// An immutable value transfer.
///
/// Only `sender`, `recipient` and `value` are covered by [`Transaction::hash`];
/// the signature and timestamp ride along without affecting the digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub value: f64,
    pub signature: Option<Signature>,
    /// Unix seconds, when the submitter supplied one.
    pub timestamp: Option<u64>,
}

/// The digested projection of a transaction. Field order is part of the
/// canonical encoding.
#[derive(Serialize)]
pub(crate) struct CanonicalTransaction<'a> {
    sender: &'a str,
    recipient: &'a str,
    value: f64,
}

impl<'a> From<&'a Transaction> for CanonicalTransaction<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            sender: &tx.sender,
            recipient: &tx.recipient,
            value: tx.value,
        }
    }
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, value: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            value,
            signature: None,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Canonical bytes: bincode of `(sender, recipient, value)`.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&CanonicalTransaction::from(self))?)
    }

    /// Transaction digest, used as the Merkle leaf.
    pub fn hash(&self) -> Result<Hash> {
        Ok(hash(&self.canonical_bytes()?))
    }

    /// Sign the transaction digest.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<()> {
        let digest = self.hash()?;
        self.signature = Some(keypair.sign_hash(&digest));
        Ok(())
    }

    pub fn signed(mut self, keypair: &Keypair) -> Result<Self> {
        self.sign(keypair)?;
        Ok(self)
    }

    /// Check the attached signature against `public_key`.
    pub fn verify(&self, public_key: &PublicKey) -> Result<()> {
        let signature = self.signature.as_ref().ok_or(CryptoError::MissingSignature)?;
        let digest = self.hash()?;
        public_key.verify(digest.as_bytes(), signature)?;
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}
