//! Snapshot persistence.
//!
//! Each collection is stored as one JSON array under
//! `<app_name>_<collection>`. Writes always replace the whole value.
//! The [`Debouncer`] collapses bursts of mutations into a single write.

use crate::entity::{Entity, EntityId, Fields};
use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use std::collections::{BTreeMap, HashSet};
use tabula_codec::Value;
use tabula_storage::KvBackend;
use tracing::{debug, warn};

/// Reads and writes collection snapshots through a key-value backend.
pub struct SnapshotStore {
    backend: Box<dyn KvBackend>,
    prefix: String,
}

impl SnapshotStore {
    /// Creates a snapshot store writing keys prefixed with `app_name`.
    pub fn new(backend: Box<dyn KvBackend>, app_name: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: app_name.into(),
        }
    }

    /// Returns the storage key for a collection.
    pub fn key_for(&self, collection: &str) -> String {
        format!("{}_{collection}", self.prefix)
    }

    /// Returns the backend.
    pub fn backend(&self) -> &dyn KvBackend {
        self.backend.as_ref()
    }

    /// Loads the snapshot of `schema`'s collection.
    ///
    /// Returns `Ok(None)` when no snapshot has been written yet.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Storage`] if the backend read fails
    /// - [`CoreError::PersistenceReadCorrupt`] if the snapshot is not a
    ///   JSON array
    pub fn try_load(&self, schema: &Schema) -> CoreResult<Option<Vec<Entity>>> {
        let key = self.key_for(&schema.name);
        let Some(text) = self.backend.get(&key)? else {
            return Ok(None);
        };
        let entities = decode_snapshot(schema, &text).map_err(|message| {
            CoreError::PersistenceReadCorrupt {
                key: key.clone(),
                message,
            }
        })?;
        debug!(key = %key, count = entities.len(), "loaded snapshot");
        Ok(Some(entities))
    }

    /// Loads a snapshot, treating a missing or unreadable one as empty.
    pub fn load(&self, schema: &Schema) -> Vec<Entity> {
        match self.try_load(schema) {
            Ok(entities) => entities.unwrap_or_default(),
            Err(e) => {
                warn!(collection = %schema.name, error = %e, "discarding unreadable snapshot");
                Vec::new()
            }
        }
    }

    /// Writes the full collection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PersistenceWriteFailed`] if the backend
    /// rejects the write.
    pub fn save(&mut self, collection: &str, entities: &[Entity]) -> CoreResult<()> {
        let key = self.key_for(collection);
        let text = encode_snapshot(entities);
        self.backend
            .set(&key, &text)
            .map_err(|e| CoreError::PersistenceWriteFailed {
                key: key.clone(),
                message: e.to_string(),
            })?;
        debug!(key = %key, count = entities.len(), bytes = text.len(), "wrote snapshot");
        Ok(())
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Serializes entities as a JSON array of objects with an `id` key.
pub fn encode_snapshot(entities: &[Entity]) -> String {
    let array: Vec<serde_json::Value> = entities
        .iter()
        .map(|entity| {
            let mut object = serde_json::Map::new();
            object.insert("id".to_string(), serde_json::Value::String(entity.id().to_string()));
            for (name, value) in entity.fields() {
                object.insert(name.clone(), value.to_json());
            }
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(array).to_string()
}

/// Reads a snapshot back into typed entities.
///
/// Only a text that is not a JSON array is an error. Within the array,
/// non-object entries are skipped, undeclared keys are dropped, missing
/// keys and ill-typed values take the field default, entries without an id
/// get a fresh one, and a repeated id keeps its first entry.
///
/// # Errors
///
/// Returns a description of the decode failure.
pub fn decode_snapshot(schema: &Schema, text: &str) -> Result<Vec<Entity>, String> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let serde_json::Value::Array(items) = json else {
        return Err("snapshot is not a JSON array".to_string());
    };

    let mut seen = HashSet::new();
    let mut entities = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            debug!(position, "skipping non-object snapshot entry");
            continue;
        };
        let id = object
            .get("id")
            .and_then(json_id)
            .unwrap_or_else(EntityId::new);
        if !seen.insert(id.clone()) {
            debug!(position, id = %id, "skipping duplicate snapshot id");
            continue;
        }

        let fields: Fields = schema
            .fields
            .iter()
            .map(|def| {
                let Some(raw) = object.get(&def.name) else {
                    return (def.name.clone(), def.initial_value());
                };
                let value = match def.field_type.coerce(&Value::from_json(raw)) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!(field = %def.name, error = %e, "snapshot value does not fit field");
                        def.initial_value()
                    }
                };
                (def.name.clone(), value)
            })
            .collect();
        entities.push(Entity::new(id, fields));
    }
    Ok(entities)
}

fn json_id(value: &serde_json::Value) -> Option<EntityId> {
    match value {
        serde_json::Value::String(s) => EntityId::parse(s),
        serde_json::Value::Number(n) => Some(EntityId::from(n.to_string())),
        _ => None,
    }
}

/// Per-collection write deadlines.
///
/// Scheduling a collection that is already pending pushes its deadline
/// back, so a burst of mutations yields one write after the burst ends.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    window_ms: i64,
    pending: BTreeMap<String, i64>,
}

impl Debouncer {
    /// Creates a debouncer with a quiet window in milliseconds.
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms: window_ms.max(0),
            pending: BTreeMap::new(),
        }
    }

    /// Arms or re-arms the deadline for `key`.
    pub fn schedule(&mut self, key: &str, now_ms: i64) {
        self.pending
            .insert(key.to_string(), now_ms.saturating_add(self.window_ms));
    }

    /// Removes and returns the keys whose deadline has passed.
    pub fn due(&mut self, now_ms: i64) -> Vec<String> {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now_ms)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.pending.remove(key);
        }
        due
    }

    /// Removes and returns every pending key.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending).into_keys().collect()
    }

    /// Returns true if `key` has a pending write.
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Returns the number of pending writes.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<i64> {
        self.pending.values().min().copied()
    }
}
