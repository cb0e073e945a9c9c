//! Key-value backend trait definition.

use crate::error::{StorageError, StorageResult};

/// A key-value port for snapshot persistence.
///
/// Backends are **opaque string stores**. Tabula owns the snapshot
/// format; backends only map keys to whole values.
///
/// # Invariants
///
/// - `set` replaces the entire value stored under `key`
/// - `get` returns exactly the last value written by `set`, or `None`
/// - A failed `set` leaves the previous value intact
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait KvBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been written under that key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the read fails.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key is invalid
    /// - The backend is out of capacity (`QuotaExceeded`)
    /// - An I/O error occurs
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the value stored under `key`.
    ///
    /// Returns `true` if a value was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&mut self, key: &str) -> StorageResult<bool>;

    /// Returns every key currently holding a value, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the keys cannot be enumerated.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Checks that a key is usable by every backend.
///
/// Keys must be non-empty, must not start with `.`, and may only contain
/// ASCII letters, digits, `_`, `-` and `.`.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] otherwise.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
