//! # Tabula Core
//!
//! Schema-driven entity management for Tabula.
//!
//! This crate provides:
//! - Schemas with typed fields, defaults and reference fields
//! - An insertion-ordered entity store with validation on every write
//! - A query engine for search, exact and range filters and sorting
//! - CSV export, import templates and fault-tolerant CSV import
//! - Snapshot persistence with debounced writes over a `KvBackend`
//! - A notification channel and a change feed for observers
//!
//! [`Workspace`] ties these together and is the usual entry point.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod clock;
mod collection;
mod config;
mod entity;
mod error;
mod notify;
mod persistence;
pub mod query;
mod schema;
mod stats;
pub mod tabular;
mod workspace;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeType};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{CollectionView, EntityStore};
pub use config::Config;
pub use entity::{Entity, EntityDraft, EntityId, Fields};
pub use error::{CoreError, CoreResult};
pub use notify::{Notification, NotificationChannel, NotificationKind};
pub use persistence::{decode_snapshot, encode_snapshot, Debouncer, SnapshotStore};
pub use schema::{FieldDef, Schema, SchemaBuilder, SchemaSet};
pub use stats::CollectionStats;
pub use workspace::Workspace;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use tabula_codec::{FieldType, ItemField, ScalarType, Value};
pub use tabula_storage::{FileBackend, InMemoryBackend, KvBackend};
