//! In-memory key-value backend for testing.

use crate::backend::{validate_key, KvBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An in-memory key-value backend.
///
/// This backend stores all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Sessions that don't need persistence
///
/// Clones share the same underlying map, so a test can keep a handle
/// to inspect what a workspace wrote after handing it a clone.
///
/// An optional byte quota simulates a storage area that rejects writes
/// once full, the way browser local storage does.
///
/// # Example
///
/// ```rust
/// use tabula_storage::{KvBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let observer = backend.clone();
/// backend.set("k", "v").unwrap();
/// assert_eq!(observer.get("k").unwrap().as_deref(), Some("v"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that rejects writes once the total stored bytes
    /// (keys plus values) would exceed `limit`.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(limit),
        }
    }

    /// Creates a new in-memory backend with pre-existing entries.
    ///
    /// Useful for testing startup hydration.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
            quota: None,
        }
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    /// Returns the number of bytes currently stored (keys plus values).
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    /// Clears all entries.
    pub fn clear(&mut self) {
        self.entries.write().clear();
    }
}

impl KvBackend for InMemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self.entries.write();

        if let Some(limit) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let required = others + key.len() + value.len();
            if required > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.entries.write().remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.keys().unwrap().is_empty());
        assert_eq!(backend.used_bytes(), 0);
    }

    #[test]
    fn memory_get_missing_is_none() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.get("absent").unwrap(), None);
    }

    #[test]
    fn memory_set_replaces_value() {
        let mut backend = InMemoryBackend::new();
        backend.set("k", "first").unwrap();
        backend.set("k", "second").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("second"));
        assert_eq!(backend.keys().unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn memory_remove() {
        let mut backend = InMemoryBackend::new();
        backend.set("k", "v").unwrap();
        assert!(backend.remove("k").unwrap());
        assert!(!backend.remove("k").unwrap());
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn memory_clones_share_state() {
        let mut backend = InMemoryBackend::new();
        let observer = backend.clone();
        backend.set("shared", "yes").unwrap();
        assert_eq!(observer.get("shared").unwrap().as_deref(), Some("yes"));
    }

    #[test]
    fn memory_with_entries() {
        let backend = InMemoryBackend::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(backend.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn memory_quota_rejects_oversized_write() {
        let mut backend = InMemoryBackend::with_quota(10);
        backend.set("k", "12345").unwrap();

        let result = backend.set("other", "123456789");
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));

        // Previous value survives the rejected write
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("12345"));
        assert_eq!(backend.get("other").unwrap(), None);
    }

    #[test]
    fn memory_quota_counts_replacement_not_sum() {
        let mut backend = InMemoryBackend::with_quota(8);
        backend.set("k", "1234567").unwrap();
        // Replacing the same key only needs room for the new value
        backend.set("k", "7654321").unwrap();
        assert_eq!(backend.used_bytes(), 8);
    }

    #[test]
    fn memory_invalid_key() {
        let mut backend = InMemoryBackend::new();
        assert!(matches!(
            backend.set("a/b", "v"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn memory_clear() {
        let mut backend = InMemoryBackend::new();
        backend.set("k", "v").unwrap();
        backend.clear();
        assert!(backend.keys().unwrap().is_empty());
    }
}
