//! Proof of Authority block signing.
//!
//! A fixed allow-list of authority addresses may attach a signature to a
//! block. The signature is a deterministic digest of block metadata:
//!
//! ```text
//! signature = hex(H("{prev_hash_hex}|{address}|{timestamp}"))
//! ```
//!
//! Under the default [`SignatureScope::Header`] only the previous digest, the
//! signing address and the timestamp are authenticated. The Merkle root and the
//! transactions are **not** covered, so a block's content can be replaced
//! without invalidating its signature. [`SignatureScope::HeaderAndMerkleRoot`]
//! is an opt-in extension that also binds the Merkle root.

use authledger_core::{hash, Block};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during consensus operations.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("unauthorized authority: {0}")]
    Unauthorized(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Fields covered by an authority signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureScope {
    /// `prev_hash | address | timestamp`.
    #[default]
    Header,
    /// `prev_hash | address | timestamp | merkle_root`.
    HeaderAndMerkleRoot,
}

/// Proof of Authority configuration.
#[derive(Debug, Clone, Default)]
pub struct PoaConfig {
    /// Which block fields a signature authenticates.
    pub signature_scope: SignatureScope,
}

/// Identity of one registry entry. Re-adding an address yields a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorityId(pub u64);

/// One signer entry. Revocation is terminal for the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    pub id: AuthorityId,
    pub address: String,
    pub active: bool,
}

/// The signer allow-list and signing protocol.
#[derive(Debug, Clone, Default)]
pub struct AuthorityRegistry {
    entries: Vec<Authority>,
    next_id: u64,
    config: PoaConfig,
}

impl AuthorityRegistry {
    pub fn new(config: PoaConfig) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            config,
        }
    }

    /// Create a registry with every address active, in order.
    pub fn with_authorities<I, S>(addresses: I, config: PoaConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new(config);
        for address in addresses {
            registry.add_authority(address);
        }
        registry
    }

    pub fn config(&self) -> &PoaConfig {
        &self.config
    }

    /// All entries in insertion order, revoked ones included.
    pub fn authorities(&self) -> &[Authority] {
        &self.entries
    }

    pub fn get(&self, id: AuthorityId) -> Option<&Authority> {
        self.entries.iter().find(|a| a.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|a| a.active).count()
    }

    /// True iff any active entry has this address.
    pub fn is_authorized(&self, address: &str) -> bool {
        self.entries.iter().any(|a| a.active && a.address == address)
    }

    /// Append a new active entry. Duplicates are kept as separate entries.
    pub fn add_authority(&mut self, address: impl Into<String>) -> AuthorityId {
        let id = AuthorityId(self.next_id);
        self.next_id += 1;
        let address = address.into();
        info!(id = id.0, %address, "authority added");
        self.entries.push(Authority {
            id,
            address,
            active: true,
        });
        id
    }

    /// Revoke the first entry registered under `address`.
    ///
    /// Returns the revoked entry's id, or `None` when the address is unknown or
    /// its first entry is already revoked. Later entries for the same address
    /// are untouched, so a re-added address stays authorized; use
    /// [`AuthorityRegistry::revoke_entry`] to revoke one of those.
    pub fn revoke_authority(&mut self, address: &str) -> Option<AuthorityId> {
        let entry = self.entries.iter_mut().find(|a| a.address == address)?;
        if !entry.active {
            return None;
        }
        entry.active = false;
        info!(id = entry.id.0, %address, "authority revoked");
        Some(entry.id)
    }

    /// Revoke one entry by identity. Returns false if unknown or already revoked.
    pub fn revoke_entry(&mut self, id: AuthorityId) -> bool {
        match self.entries.iter_mut().find(|a| a.id == id) {
            Some(entry) if entry.active => {
                entry.active = false;
                info!(id = id.0, address = %entry.address, "authority revoked");
                true
            }
            _ => false,
        }
    }

    /// Compute the signature `address` would produce for `block`.
    pub fn signature_for(&self, address: &str, block: &Block) -> String {
        let message = match self.config.signature_scope {
            SignatureScope::Header => format!(
                "{}|{}|{}",
                block.prev_hash.to_hex(),
                address,
                block.timestamp
            ),
            SignatureScope::HeaderAndMerkleRoot => format!(
                "{}|{}|{}|{}",
                block.prev_hash.to_hex(),
                address,
                block.timestamp,
                block.merkle_root.to_hex()
            ),
        };
        hash(message.as_bytes()).to_hex()
    }

    /// Attach `address`'s signature to `block`.
    pub fn sign_block(&self, address: &str, block: &mut Block) -> Result<()> {
        if !self.is_authorized(address) {
            warn!(%address, "rejected signing attempt by unauthorized address");
            return Err(ConsensusError::Unauthorized(address.to_string()));
        }
        block.signature = Some(self.signature_for(address, block));
        Ok(())
    }

    /// Check that `block` carries `address`'s signature and that `address`
    /// is currently authorized.
    pub fn verify_block(&self, block: &Block, address: &str) -> bool {
        if !self.is_authorized(address) {
            return false;
        }
        block.signature.as_deref() == Some(self.signature_for(address, block).as_str())
    }
}

/// A registry shared between threads.
///
/// Mutations take the write lock; authorization checks, signing and
/// verification take the read lock, so no reader sees a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct SharedAuthorityRegistry {
    inner: Arc<RwLock<AuthorityRegistry>>,
}

impl SharedAuthorityRegistry {
    pub fn new(registry: AuthorityRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn add_authority(&self, address: impl Into<String>) -> AuthorityId {
        self.inner.write().add_authority(address)
    }

    pub fn revoke_authority(&self, address: &str) -> Option<AuthorityId> {
        self.inner.write().revoke_authority(address)
    }

    pub fn revoke_entry(&self, id: AuthorityId) -> bool {
        self.inner.write().revoke_entry(id)
    }

    pub fn is_authorized(&self, address: &str) -> bool {
        self.inner.read().is_authorized(address)
    }

    pub fn sign_block(&self, address: &str, block: &mut Block) -> Result<()> {
        self.inner.read().sign_block(address, block)
    }

    pub fn verify_block(&self, block: &Block, address: &str) -> bool {
        self.inner.read().verify_block(block, address)
    }

    /// Clone of the current registry state.
    pub fn snapshot(&self) -> AuthorityRegistry {
        self.inner.read().clone()
    }
}
