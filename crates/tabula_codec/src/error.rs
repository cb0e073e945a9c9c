//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to write CSV output.
    #[error("CSV encoding failed: {message}")]
    Csv {
        /// Description of the CSV error.
        message: String,
    },

    /// Failed to encode or decode JSON.
    #[error("JSON error: {message}")]
    Json {
        /// Description of the JSON error.
        message: String,
    },

    /// A value does not fit the declared field type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the declared type.
        expected: String,
        /// Name of the value's actual type.
        found: String,
    },
}

impl CodecError {
    /// Create a CSV error.
    pub fn csv(message: impl Into<String>) -> Self {
        Self::Csv {
            message: message.into(),
        }
    }

    /// Create a JSON error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::json(e.to_string())
    }
}

impl From<csv::Error> for CodecError {
    fn from(e: csv::Error) -> Self {
        Self::csv(e.to_string())
    }
}
