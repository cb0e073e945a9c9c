//! File-based key-value backend for persistent storage.

use crate::backend::{validate_key, KvBackend};
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const VALUE_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// A directory-backed key-value backend.
///
/// Each key is stored as `<dir>/<key>.json`. Values survive process
/// restarts.
///
/// # Durability
///
/// `set` writes to a temporary sibling file, syncs it, then renames it
/// over the target. Readers therefore see either the old value or the
/// new one, never a torn write.
///
/// # Example
///
/// ```no_run
/// use tabula_storage::{KvBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data")).unwrap();
/// backend.set("fleet_vehicles", "[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens a backend rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the directory holding the value files.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Returns the file that holds the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid.
    pub fn value_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{TEMP_EXTENSION}"))
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.value_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StorageError::InvalidEncoding {
                    key: key.to_string(),
                }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.value_path(key)?;
        let temp = self.temp_path(key);

        {
            let mut file = File::create(&temp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_get_missing_is_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("nothing").unwrap(), None);
    }

    #[test]
    fn file_set_and_get() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(dir.path()).unwrap();

        backend.set("orders", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            backend.get("orders").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
        assert!(dir.path().join("orders.json").exists());
        assert!(!dir.path().join("orders.json.tmp").exists());
    }

    #[test]
    fn file_persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut backend = FileBackend::open(dir.path()).unwrap();
            backend.set("k", "persistent").unwrap();
        }
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("persistent"));
    }

    #[test]
    fn file_set_replaces_whole_value() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(dir.path()).unwrap();
        backend.set("k", "a much longer first value").unwrap();
        backend.set("k", "short").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn file_keys_and_remove() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(dir.path()).unwrap();
        backend.set("b", "2").unwrap();
        backend.set("a", "1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(backend.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(backend.remove("a").unwrap());
        assert!(!backend.remove("a").unwrap());
        assert_eq!(backend.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn file_open_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("x").join("y");
        let backend = FileBackend::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(backend.path(), nested.as_path());
    }

    #[test]
    fn file_rejects_traversal_keys() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(dir.path()).unwrap();
        assert!(matches!(
            backend.set("../escape", "v"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
