//! Change feed for observing store mutations.
//!
//! Every applied create, update, remove and cascading detach is emitted
//! as a [`ChangeEvent`], in the order the mutations were applied. UI
//! layers subscribe to re-read their views; nothing re-renders
//! implicitly.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut workspace = Workspace::open_in_memory()?;
//! workspace.register(schema)?;
//!
//! let receiver = workspace.subscribe();
//! workspace.create("vehicles", EntityDraft::new().set("plate", "AB-123"))?;
//!
//! for event in receiver.try_iter() {
//!     println!("{} {:?} {}", event.collection, event.change_type, event.entity_id);
//! }
//! ```

use crate::entity::EntityId;
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// Type of change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// Entity was created.
    Insert,
    /// Entity was updated by a patch.
    Update,
    /// Entity was removed.
    Delete,
    /// A reference field of the entity was cleared because its target
    /// was removed.
    Detach,
}

/// A single change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Position of the change in the workspace's mutation order.
    pub sequence: u64,
    /// Collection name.
    pub collection: String,
    /// Affected entity.
    pub entity_id: EntityId,
    /// Type of change.
    pub change_type: ChangeType,
}

impl ChangeEvent {
    /// Creates an event.
    pub fn new(
        sequence: u64,
        collection: impl Into<String>,
        entity_id: EntityId,
        change_type: ChangeType,
    ) -> Self {
        Self {
            sequence,
            collection: collection.into(),
            entity_id,
            change_type,
        }
    }
}

/// Distributes change events to subscribers.
pub struct ChangeFeed {
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
}

impl ChangeFeed {
    /// Creates a change feed with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to all future change events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits a change event to all subscribers.
    pub fn emit(&self, event: ChangeEvent) {
        // Disconnected receivers are dropped here.
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
