//! Error types for Tabula core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Tabula core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] tabula_storage::StorageError),

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] tabula_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A create or update violates the collection schema.
    #[error("invalid {field} in {collection}: {reason}")]
    ValidationFailed {
        /// The collection being written.
        collection: String,
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A create supplied an id that is already in use.
    #[error("duplicate id {id} in {collection}")]
    DuplicateId {
        /// The collection being written.
        collection: String,
        /// The colliding id.
        id: String,
    },

    /// Entity not found.
    #[error("entity not found: {id} in {collection}")]
    NotFound {
        /// The collection searched.
        collection: String,
        /// The id that was not found.
        id: String,
    },

    /// Collection not found.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// Collection registered twice.
    #[error("collection already registered: {name}")]
    CollectionExists {
        /// Name of the collection.
        name: String,
    },

    /// Schema definition is inconsistent.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },

    /// The storage backend rejected a snapshot write.
    #[error("failed to write snapshot {key}: {message}")]
    PersistenceWriteFailed {
        /// Snapshot key.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// A stored snapshot could not be decoded.
    #[error("snapshot {key} is corrupt: {message}")]
    PersistenceReadCorrupt {
        /// Snapshot key.
        key: String,
        /// Description of the decode failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(
        collection: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ValidationFailed {
            collection: collection.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the caller's input rather than
    /// the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed { .. } | Self::DuplicateId { .. } | Self::NotFound { .. }
        )
    }
}
