//! Test fixtures and workspace helpers.
//!
//! Provides convenience functions for setting up test workspaces with a
//! controllable clock and an inspectable backend.

use crate::schemas::fleet_schemas;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tabula_core::{Config, FileBackend, InMemoryBackend, KvBackend, ManualClock, Schema, Workspace};
use tempfile::TempDir;

/// Start time of every fixture clock: 2024-03-01T00:00:00Z.
pub const FIXTURE_EPOCH_MS: i64 = 1_709_251_200_000;

/// Snapshot key prefix used by fixtures.
pub const FIXTURE_APP: &str = "fleet";

/// A test workspace with a manual clock and automatic cleanup.
pub struct TestWorkspace {
    /// The workspace instance.
    pub workspace: Workspace,
    /// The clock driving debounce and notification expiry.
    pub clock: ManualClock,
    schemas: Vec<Schema>,
    memory: Option<InMemoryBackend>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestWorkspace {
    /// Creates an empty in-memory test workspace.
    pub fn memory() -> Self {
        let backend = InMemoryBackend::new();
        let clock = ManualClock::new(FIXTURE_EPOCH_MS);
        Self {
            workspace: open(Box::new(backend.clone()), &clock),
            clock,
            schemas: Vec::new(),
            memory: Some(backend),
            _temp_dir: None,
        }
    }

    /// Creates an empty file-backed test workspace in a temporary
    /// directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let backend =
            FileBackend::open(temp_dir.path()).expect("Failed to open file backend");
        let clock = ManualClock::new(FIXTURE_EPOCH_MS);
        Self {
            workspace: open(Box::new(backend), &clock),
            clock,
            schemas: Vec::new(),
            memory: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates an in-memory workspace with the vehicles, shipments and
    /// orders collections registered.
    pub fn fleet() -> Self {
        Self::memory().with_schemas(fleet_schemas())
    }

    /// Registers `schemas`, in order.
    pub fn with_schemas(mut self, schemas: Vec<Schema>) -> Self {
        for schema in schemas {
            self.workspace
                .register(schema.clone())
                .expect("Failed to register schema");
            self.schemas.push(schema);
        }
        self
    }

    /// Drops the workspace, which flushes it, and opens a new one over the
    /// same storage with the same schemas.
    pub fn reopen(self) -> Self {
        let Self {
            workspace,
            clock,
            schemas,
            memory,
            _temp_dir,
        } = self;
        drop(workspace);

        let backend: Box<dyn KvBackend> = match (&memory, &_temp_dir) {
            (Some(backend), _) => Box::new(backend.clone()),
            (None, Some(dir)) => {
                Box::new(FileBackend::open(dir.path()).expect("Failed to reopen file backend"))
            }
            (None, None) => unreachable!("fixture has no storage"),
        };
        let reopened = Self {
            workspace: open(backend, &clock),
            clock,
            schemas: Vec::new(),
            memory,
            _temp_dir,
        };
        reopened.with_schemas(schemas)
    }

    /// Returns the in-memory backend, if this fixture uses one.
    pub fn backend(&self) -> Option<&InMemoryBackend> {
        self.memory.as_ref()
    }

    /// Returns the storage directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().to_path_buf())
    }

    /// Returns the raw snapshot text stored for `collection`.
    pub fn snapshot(&self, collection: &str) -> Option<String> {
        let key = format!("{FIXTURE_APP}_{collection}");
        match (&self.memory, &self._temp_dir) {
            (Some(backend), _) => backend.get(&key).expect("Failed to read snapshot"),
            (None, Some(dir)) => FileBackend::open(dir.path())
                .and_then(|b| b.get(&key))
                .expect("Failed to read snapshot"),
            (None, None) => None,
        }
    }

    /// Advances the clock past the debounce window and writes due
    /// snapshots.
    pub fn settle(&mut self) -> usize {
        self.clock
            .advance(self.workspace.config().persist_debounce + Duration::from_millis(1));
        self.workspace.tick()
    }
}

fn open(backend: Box<dyn KvBackend>, clock: &ManualClock) -> Workspace {
    Workspace::open_with_clock(
        Config::new().app_name(FIXTURE_APP),
        backend,
        Arc::new(clock.clone()),
    )
}

impl std::ops::Deref for TestWorkspace {
    type Target = Workspace;

    fn deref(&self) -> &Self::Target {
        &self.workspace
    }
}

impl std::ops::DerefMut for TestWorkspace {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.workspace
    }
}

/// Runs a test with a temporary in-memory fleet workspace.
///
/// # Example
///
/// ```rust,ignore
/// use tabula_testkit::with_fleet;
///
/// #[test]
/// fn my_test() {
///     with_fleet(|ws| {
///         ws.create("vehicles", vehicle("v1", "AB-1")).unwrap();
///     });
/// }
/// ```
pub fn with_fleet<F, R>(f: F) -> R
where
    F: FnOnce(&mut Workspace) -> R,
{
    let mut fixture = TestWorkspace::fleet();
    f(&mut fixture.workspace)
}

/// Writes `text` to a file named `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("Failed to write fixture file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::vehicle;

    #[test]
    fn reopen_keeps_memory_state() {
        let mut fixture = TestWorkspace::fleet();
        fixture.create("vehicles", vehicle("v1", "AB-1")).unwrap();
        let fixture = fixture.reopen();
        assert_eq!(fixture.list("vehicles").unwrap().len(), 1);
    }

    #[test]
    fn reopen_keeps_file_state() {
        let mut fixture = TestWorkspace::file().with_schemas(fleet_schemas());
        fixture.create("vehicles", vehicle("v1", "AB-1")).unwrap();
        assert!(fixture.snapshot("vehicles").is_none());
        assert_eq!(fixture.settle(), 1);
        assert!(fixture.snapshot("vehicles").is_some());

        let fixture = fixture.reopen();
        assert_eq!(fixture.list("vehicles").unwrap().len(), 1);
        assert!(fixture.path().is_some());
    }
}
