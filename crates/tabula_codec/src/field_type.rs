//! Declared field types and coercion.

use crate::error::{CodecError, CodecResult};
use crate::list::{decode_list, encode_list};
use crate::scalar::{match_enum, parse_bool, parse_bool_strict, parse_date, parse_number};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The declared type of a schema field.
///
/// Serialized with an internal `type` tag so schemas read naturally as
/// JSON:
///
/// ```json
/// { "type": "enum", "values": ["pending", "approved"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// Free text.
    Text,
    /// Floating point number.
    Number,
    /// Boolean flag.
    Bool,
    /// Point in time.
    Date,
    /// One of a fixed set of strings.
    Enum {
        /// Allowed values; the first is the import fallback.
        values: Vec<String>,
    },
    /// List of primitives, or of small records when `item_fields` is set.
    List {
        /// Ordered fields of each item (e.g. `name`, `qty`, `price`).
        #[serde(default)]
        item_fields: Vec<ItemField>,
    },
    /// Nested record with arbitrary keys.
    Record,
    /// Id of an entity in another collection.
    Reference {
        /// Name of the referenced collection.
        target: String,
    },
}

/// Primitive types allowed inside list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// Free text.
    #[default]
    Text,
    /// Floating point number.
    Number,
    /// Boolean flag.
    Bool,
    /// Point in time.
    Date,
}

/// One named column of a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemField {
    /// Field name inside the item record.
    pub name: String,
    /// Primitive type of the field.
    #[serde(rename = "type", default)]
    pub kind: ScalarType,
}

impl ItemField {
    /// Creates an item field.
    pub fn new(name: impl Into<String>, kind: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl ScalarType {
    /// Returns the equivalent field type.
    pub fn field_type(self) -> FieldType {
        match self {
            ScalarType::Text => FieldType::Text,
            ScalarType::Number => FieldType::Number,
            ScalarType::Bool => FieldType::Bool,
            ScalarType::Date => FieldType::Date,
        }
    }
}

impl FieldType {
    /// Shorthand for an enum type.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldType::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Shorthand for a reference to another collection.
    pub fn reference(target: impl Into<String>) -> Self {
        FieldType::Reference {
            target: target.into(),
        }
    }

    /// Shorthand for a list of records with the given item fields.
    pub fn list_of(item_fields: Vec<ItemField>) -> Self {
        FieldType::List { item_fields }
    }

    /// Returns a short name for the type, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Enum { .. } => "enum",
            FieldType::List { .. } => "list",
            FieldType::Record => "record",
            FieldType::Reference { .. } => "reference",
        }
    }

    /// Returns true for types the sort comparator treats numerically.
    pub fn is_numeric_axis(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Date)
    }

    /// Strictly converts `value` to this type.
    ///
    /// Used for validating patches and for reading snapshots back.
    /// Text that parses cleanly is accepted for numbers, booleans, dates
    /// and enums (form inputs and JSON dates arrive as text); enum members
    /// are normalized to their declared spelling. An empty list becomes
    /// `Null`. `Null` is always accepted; whether it is allowed is the
    /// schema's decision.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TypeMismatch`] when the value cannot represent
    /// this type.
    pub fn coerce(&self, value: &Value) -> CodecResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let mismatch = || CodecError::type_mismatch(self.name(), value.type_name());

        match (self, value) {
            (FieldType::Text | FieldType::Reference { .. }, Value::Text(_)) => Ok(value.clone()),
            (FieldType::Number, Value::Number(n)) if n.is_finite() => Ok(value.clone()),
            (FieldType::Number, Value::Text(s)) => {
                parse_number(s).map(Value::Number).ok_or_else(mismatch)
            }
            (FieldType::Bool, Value::Bool(_)) => Ok(value.clone()),
            (FieldType::Bool, Value::Text(s)) => {
                parse_bool_strict(s).map(Value::Bool).ok_or_else(mismatch)
            }
            (FieldType::Date, Value::Date(_)) => Ok(value.clone()),
            #[allow(clippy::cast_possible_truncation)]
            (FieldType::Date, Value::Number(n)) if n.is_finite() => Ok(Value::Date(*n as i64)),
            (FieldType::Date, Value::Text(s)) => parse_date(s).map(Value::Date).ok_or_else(mismatch),
            (FieldType::Enum { values }, Value::Text(s)) => match_enum(values, s)
                .map(Value::from)
                .ok_or_else(|| CodecError::type_mismatch(format!("one of {values:?}"), s.clone())),
            // An empty list and an absent one are the same value; both
            // export as a blank cell.
            (FieldType::List { .. }, Value::List(items)) if items.is_empty() => Ok(Value::Null),
            (FieldType::List { item_fields }, Value::List(items)) => items
                .iter()
                .map(|item| coerce_item(item_fields, item))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::List),
            (FieldType::Record, Value::Record(_)) => Ok(value.clone()),
            _ => Err(mismatch()),
        }
    }

    /// Leniently parses a CSV cell into this type.
    ///
    /// Never fails. Fallbacks: numbers `0`, dates `now_ms`, enums the first
    /// declared value, booleans `false`, lists and records empty, text and
    /// references `Null` when the cell is empty.
    pub fn parse_cell(&self, cell: &str, now_ms: i64) -> Value {
        let trimmed = cell.trim();
        match self {
            FieldType::Text | FieldType::Reference { .. } => {
                if trimmed.is_empty() {
                    Value::Null
                } else {
                    Value::Text(trimmed.to_string())
                }
            }
            FieldType::Number => Value::Number(parse_number(trimmed).unwrap_or(0.0)),
            FieldType::Bool => Value::Bool(parse_bool(trimmed)),
            FieldType::Date => Value::Date(parse_date(trimmed).unwrap_or(now_ms)),
            FieldType::Enum { values } => match_enum(values, trimmed)
                .or_else(|| values.first().map(String::as_str))
                .map_or(Value::Null, Value::from),
            FieldType::List { item_fields } => Value::List(decode_list(trimmed, item_fields)),
            FieldType::Record => serde_json::from_str::<serde_json::Value>(trimmed)
                .ok()
                .map(|json| Value::from_json(&json))
                .filter(|v| matches!(v, Value::Record(_)))
                .unwrap_or_else(|| Value::Record(BTreeMap::new())),
        }
    }

    /// Renders a value of this type as CSV cell text.
    pub fn format_cell(&self, value: &Value) -> String {
        match (self, value) {
            (FieldType::List { item_fields }, Value::List(items)) => encode_list(items, item_fields),
            (FieldType::Record, Value::Record(_)) => {
                serde_json::to_string(&value.to_json()).unwrap_or_default()
            }
            _ => value.to_display_string(),
        }
    }
}

fn coerce_item(item_fields: &[ItemField], item: &Value) -> CodecResult<Value> {
    if item_fields.is_empty() {
        return match item {
            Value::List(_) | Value::Record(_) => {
                Err(CodecError::type_mismatch("primitive", item.type_name()))
            }
            _ => Ok(item.clone()),
        };
    }

    let Value::Record(map) = item else {
        return Err(CodecError::type_mismatch("record", item.type_name()));
    };
    let mut out = BTreeMap::new();
    for field in item_fields {
        let raw = map.get(&field.name).unwrap_or(&Value::Null);
        out.insert(field.name.clone(), field.kind.field_type().coerce(raw)?);
    }
    Ok(Value::Record(out))
}
