//! Collection schemas.
//!
//! A [`Schema`] declares the ordered, typed fields of one collection.
//! Schemas are plain serde data so they can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "collections": [
//!     {
//!       "name": "shipments",
//!       "fields": [
//!         { "name": "reference", "type": "text", "required": true, "searchable": true },
//!         { "name": "status", "type": "enum", "values": ["unassigned", "assigned"],
//!           "default": "unassigned" },
//!         { "name": "vehicle_id", "type": "reference", "target": "vehicles",
//!           "on_detach": { "status": "unassigned" } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tabula_codec::{FieldType, Value};

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, unique within the schema.
    pub name: String,

    /// Declared type.
    #[serde(flatten)]
    pub field_type: FieldType,

    /// Whether the field must hold a non-blank value.
    #[serde(default)]
    pub required: bool,

    /// Value used when a create or import omits the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Whether free-text search looks at this field by default.
    #[serde(default)]
    pub searchable: bool,

    /// Resets applied to the referencing entity when the referenced
    /// entity is removed. Only meaningful on reference fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on_detach: BTreeMap<String, Value>,
}

impl FieldDef {
    /// Creates an optional, non-searchable field with no default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            searchable: false,
            on_detach: BTreeMap::new(),
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Includes the field in the default search fields.
    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Adds a reset applied when the referenced entity is removed.
    #[must_use]
    pub fn on_detach(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.on_detach.insert(field.into(), value.into());
        self
    }

    /// Returns the referenced collection for reference fields.
    pub fn reference_target(&self) -> Option<&str> {
        match &self.field_type {
            FieldType::Reference { target } => Some(target),
            _ => None,
        }
    }

    /// Returns the value a new entity gets when the field is omitted.
    pub fn initial_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }
}

/// Declared field list of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Collection name. Also the snapshot key suffix and export file stem.
    pub name: String,

    /// Human readable singular name used in notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Fields in declared order.
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Starts building a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                name: name.into(),
                label: None,
                fields: Vec::new(),
            },
        }
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the index of a field in declared order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Names of the fields marked searchable.
    pub fn searchable_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Reference fields pointing at `target`.
    pub fn references_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a FieldDef> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.reference_target() == Some(target))
    }

    /// Singular display name: the label, or the collection name.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Checks the schema for consistency and normalizes defaults.
    ///
    /// Defaults and detach resets are coerced to their field types, so a
    /// date default written as `"2024-01-01"` in a JSON schema becomes a
    /// date value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] when the collection name is
    /// empty, a field name is empty, duplicated or `id`, an enum declares
    /// no values, a reference field is required, a default or reset does
    /// not fit its field type, or a reset names an unknown field or clears
    /// a required one.
    pub fn validated(mut self) -> CoreResult<Self> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid_schema("collection name is empty"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(self.problem("a field has an empty name"));
            }
            if field.name == "id" {
                return Err(self.problem("`id` is reserved"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(self.problem(format!("duplicate field `{}`", field.name)));
            }
            match &field.field_type {
                FieldType::Enum { values } if values.is_empty() => {
                    return Err(self.problem(format!("enum field `{}` has no values", field.name)));
                }
                FieldType::Reference { target } if target.trim().is_empty() => {
                    return Err(self.problem(format!("reference field `{}` has no target", field.name)));
                }
                // Removing the target clears the field, so it cannot be required.
                FieldType::Reference { .. } if field.required => {
                    return Err(self.problem(format!(
                        "reference field `{}` cannot be required",
                        field.name
                    )));
                }
                _ => {}
            }
            if !field.on_detach.is_empty() && field.reference_target().is_none() {
                return Err(self.problem(format!(
                    "`{}` declares detach resets but is not a reference",
                    field.name
                )));
            }
        }

        let types: BTreeMap<String, FieldType> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.field_type.clone()))
            .collect();
        let required: HashSet<String> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect();
        let name = self.name.clone();
        let problem = |message: String| {
            CoreError::invalid_schema(format!("{name}: {message}"))
        };

        for field in &mut self.fields {
            if let Some(default) = &field.default {
                let coerced = field
                    .field_type
                    .coerce(default)
                    .map_err(|e| problem(format!("default of `{}`: {e}", field.name)))?;
                field.default = Some(coerced);
            }
            for (target, value) in &mut field.on_detach {
                let field_type = types.get(target).ok_or_else(|| {
                    problem(format!("`{}` resets unknown field `{target}`", field.name))
                })?;
                *value = field_type
                    .coerce(value)
                    .map_err(|e| problem(format!("reset of `{target}`: {e}")))?;
                if value.is_null() && required.contains(target.as_str()) {
                    return Err(problem(format!("reset clears required field `{target}`")));
                }
            }
        }

        Ok(self)
    }

    fn problem(&self, message: impl std::fmt::Display) -> CoreError {
        CoreError::invalid_schema(format!("{}: {message}", self.name))
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Sets the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.schema.label = Some(label.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.schema.fields.push(field);
        self
    }

    /// Validates and returns the schema.
    ///
    /// # Errors
    ///
    /// See [`Schema::validated`].
    pub fn build(self) -> CoreResult<Schema> {
        self.schema.validated()
    }
}

/// A set of schemas, the shape of a schema file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSet {
    /// Collections in registration order.
    pub collections: Vec<Schema>,
}

impl SchemaSet {
    /// Parses a schema set from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Codec`] when the text is not a valid schema
    /// file.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let set: SchemaSet =
            serde_json::from_str(text).map_err(tabula_codec::CodecError::from)?;
        Ok(set)
    }

    /// Reads a schema set from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] when the file cannot be read, or
    /// [`CoreError::Codec`] when it is malformed.
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Looks up a schema by collection name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.collections.iter().find(|s| s.name == name)
    }
}
