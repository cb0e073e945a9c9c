//! # Tabula Storage
//!
//! Key-value storage port and implementations for Tabula.
//!
//! This crate provides the lowest-level persistence abstraction for Tabula.
//! Backends are **opaque string stores** - they do not interpret the
//! snapshots they hold.
//!
//! ## Design Principles
//!
//! - Backends are simple key-value stores (get, set, remove)
//! - No knowledge of entities, schemas, or snapshot formats
//! - Every `set` replaces the whole value; a value is never partially written
//! - Must be `Send + Sync` so a workspace can be moved between threads
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral sessions
//! - [`FileBackend`] - One file per key inside a directory
//!
//! ## Example
//!
//! ```rust
//! use tabula_storage::{KvBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.set("demo_orders", "[]").unwrap();
//! assert_eq!(backend.get("demo_orders").unwrap().as_deref(), Some("[]"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{validate_key, KvBackend};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
