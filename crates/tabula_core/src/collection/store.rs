//! Entity store: the canonical ordered collection.

use crate::entity::{Entity, EntityDraft, EntityId, Fields};
use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use std::collections::{BTreeMap, HashMap};
use tabula_codec::Value;

/// Holds the entities of one collection in insertion order.
///
/// The store guarantees:
/// - No two entities share an id
/// - Every stored entity has every declared field, typed per the schema
/// - Updates keep the entity's position
///
/// A failed create or update leaves the store unchanged.
#[derive(Debug, Clone)]
pub struct EntityStore {
    schema: Schema,
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
}

impl EntityStore {
    /// Creates an empty store for `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the collection schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Creates an entity.
    ///
    /// Missing fields are filled from schema defaults. A fresh id is
    /// generated when the draft carries none.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DuplicateId`] if the draft id is already stored
    /// - [`CoreError::ValidationFailed`] if the fields violate the schema
    pub fn create(&mut self, draft: EntityDraft) -> CoreResult<Entity> {
        let id = match draft.id {
            Some(id) if id.as_str().trim().is_empty() => {
                return Err(CoreError::validation(self.name(), "id", "id must not be empty"));
            }
            Some(id) if self.index.contains_key(&id) => {
                return Err(CoreError::DuplicateId {
                    collection: self.name().to_string(),
                    id: id.to_string(),
                });
            }
            Some(id) => id,
            None => self.fresh_id(),
        };

        let mut fields: Fields = self
            .schema
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.initial_value()))
            .collect();
        self.merge_into(&mut fields, draft.fields)?;
        self.check_required(&fields)?;

        let entity = Entity::new(id.clone(), fields);
        self.index.insert(id, self.entities.len());
        self.entities.push(entity.clone());
        Ok(entity)
    }

    /// Merges `patch` into an existing entity in place.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no entity has `id`
    /// - [`CoreError::ValidationFailed`] if the patch names `id`, an
    ///   unknown field, a value of the wrong type, or blanks a required
    ///   field
    pub fn update(&mut self, id: &EntityId, patch: Fields) -> CoreResult<Entity> {
        let position = self.position(id)?;
        let mut fields = self.entities[position].fields().clone();
        self.merge_into(&mut fields, patch)?;
        self.check_required(&fields)?;

        let entity = &mut self.entities[position];
        *entity.fields_mut() = fields;
        Ok(entity.clone())
    }

    /// Removes an entity and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no entity has `id`.
    pub fn remove(&mut self, id: &EntityId) -> CoreResult<Entity> {
        let position = self.position(id)?;
        let entity = self.entities.remove(position);
        self.reindex();
        Ok(entity)
    }

    /// Returns all entities in stored order.
    pub fn list(&self) -> &[Entity] {
        &self.entities
    }

    /// Looks up an entity by id.
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    /// Returns true if an entity has `id`.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the number of entities.
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Removes every entity and returns them in stored order.
    pub fn clear(&mut self) -> Vec<Entity> {
        self.index.clear();
        std::mem::take(&mut self.entities)
    }

    /// Clears `field` on every entity that references `target`.
    ///
    /// Each touched entity also receives `resets`, which were validated
    /// against the schema when it was built. Returns the ids of the
    /// touched entities in stored order.
    pub fn detach_references(
        &mut self,
        field: &str,
        target: &EntityId,
        resets: &BTreeMap<String, Value>,
    ) -> Vec<EntityId> {
        let mut touched = Vec::new();
        for entity in &mut self.entities {
            if entity.text(field) != Some(target.as_str()) {
                continue;
            }
            let fields = entity.fields_mut();
            fields.insert(field.to_string(), Value::Null);
            for (name, value) in resets {
                fields.insert(name.clone(), value.clone());
            }
            touched.push(entity.id().clone());
        }
        touched
    }

    /// Replaces the contents with already-typed entities, e.g. from a
    /// snapshot. Later duplicates of an id are dropped.
    pub(crate) fn hydrate(&mut self, entities: Vec<Entity>) -> usize {
        self.clear();
        for entity in entities {
            if self.index.contains_key(entity.id()) {
                continue;
            }
            self.index.insert(entity.id().clone(), self.entities.len());
            self.entities.push(entity);
        }
        self.entities.len()
    }

    fn fresh_id(&self) -> EntityId {
        loop {
            let id = EntityId::new();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    fn position(&self, id: &EntityId) -> CoreResult<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| CoreError::not_found(self.name(), id.as_str()))
    }

    fn reindex(&mut self) {
        self.index = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id().clone(), i))
            .collect();
    }

    fn merge_into(&self, fields: &mut Fields, patch: Fields) -> CoreResult<()> {
        for (name, value) in patch {
            if name == "id" {
                return Err(CoreError::validation(self.name(), "id", "id is immutable"));
            }
            let Some(def) = self.schema.field(&name) else {
                return Err(CoreError::validation(self.name(), name, "unknown field"));
            };
            let coerced = def
                .field_type
                .coerce(&value)
                .map_err(|e| CoreError::validation(self.name(), &name, e.to_string()))?;
            fields.insert(name, coerced);
        }
        Ok(())
    }

    fn check_required(&self, fields: &Fields) -> CoreResult<()> {
        for def in self.schema.fields.iter().filter(|f| f.required) {
            if fields.get(&def.name).map_or(true, Value::is_blank) {
                return Err(CoreError::validation(self.name(), &def.name, "required"));
            }
        }
        Ok(())
    }
}
