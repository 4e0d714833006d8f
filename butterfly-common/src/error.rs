//! Error types for the butterfly-osm toolkit
//!
//! Every variant here is fatal to a conversion run. Conditions that only affect a single
//! entity (a missing node reference, an unresolvable relation) are not errors: callers get
//! `Ok(None)` and decide whether to skip.

use thiserror::Error;

/// Main error type for butterfly-osm operations
#[derive(Debug, Error)]
pub enum Error {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The entity stream could not be decoded
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// An entity arrived out of category order (nodes, then ways, then relations)
    #[error("Unexpected {found} after {previous} in entity stream")]
    StreamOrder {
        previous: &'static str,
        found: &'static str,
    },

    /// The key-value store failed to open, read or write
    #[error("Store error: {0}")]
    StoreError(String),

    /// A cached value could not be decoded
    #[error("Corrupt record for key '{key}': {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Output or snapshot serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Shorthand for a corrupt cached value
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CorruptRecord {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::IoError(err.into())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

/// Convenience result type for butterfly-osm operations
pub type Result<T> = std::result::Result<T, Error>;
