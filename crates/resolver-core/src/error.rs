//! Error types for resolver-core

use thiserror::Error;

/// Malformed name input. Always local, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Decoding error at offset {offset}: {reason}")]
    Decoding { offset: usize, reason: String },
}

impl CodecError {
    pub(crate) fn decoding(offset: usize, reason: impl Into<String>) -> Self {
        CodecError::Decoding {
            offset,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid chain id: {0}")]
    InvalidChainId(u64),

    #[error("Invalid coin type: {0}")]
    InvalidCoinType(u64),
}
