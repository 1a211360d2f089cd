//! Error types shared by the core primitives.

use crate::crypto::CryptoError;
use crate::hash::Hash;
use thiserror::Error;

/// Errors raised by Merkle, transaction and block operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("digest {0} is not a leaf of this tree")]
    NotFound(Hash),

    #[error("canonical encoding failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<bincode::Error> for CoreError {
    fn from(err: bincode::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
