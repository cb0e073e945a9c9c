//! Entity records and drafts.

use super::EntityId;
use std::collections::BTreeMap;
use tabula_codec::Value;

/// Field values keyed by field name.
pub type Fields = BTreeMap<String, Value>;

/// A stored record.
///
/// Entities are only built by a store, so every declared field of the
/// collection is present (possibly `Null`) and every value matches its
/// declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    fields: Fields,
}

impl Entity {
    pub(crate) fn new(id: EntityId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Returns the entity id.
    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Returns a field value, or `None` if the field is not declared.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field value, treating undeclared fields as `Null`.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Returns a text field, if it holds text.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.value(field).as_text()
    }

    /// Returns all field values.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Resolves a dotted path such as `address.city`.
    ///
    /// `id` resolves to the entity id. Segments past the first descend
    /// into record values; any miss yields `Null`.
    pub fn resolve_path(&self, path: &str) -> Value {
        if path == "id" {
            return Value::Text(self.id.to_string());
        }
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Value::Null;
        };
        let mut current = self.value(first);
        for segment in segments {
            current = match current.as_record().and_then(|map| map.get(segment)) {
                Some(next) => next,
                None => return Value::Null,
            };
        }
        current.clone()
    }
}

/// Input for creating an entity.
///
/// Fields that are omitted take the schema default (or `Null`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDraft {
    /// Explicit id; a fresh one is generated when `None`.
    pub id: Option<EntityId>,
    /// Field values to set.
    pub fields: Fields,
}

impl EntityDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets a field value.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Creates a draft carrying an existing entity's id and values.
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: Some(entity.id.clone()),
            fields: entity.fields.clone(),
        }
    }
}
