//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backend refused the write because it would exceed its capacity.
    #[error("quota exceeded writing {key}: {required} bytes needed, limit is {limit}")]
    QuotaExceeded {
        /// The key being written.
        key: String,
        /// Total bytes the backend would hold after the write.
        required: usize,
        /// The configured capacity in bytes.
        limit: usize,
    },

    /// The key contains characters the backend cannot store.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// The stored value is not valid UTF-8 text.
    #[error("stored value for {key} is not valid UTF-8")]
    InvalidEncoding {
        /// The key whose value could not be read.
        key: String,
    },
}
