//! CSV export and import templates.

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::schema::{FieldDef, Schema};
use chrono::DateTime;
use std::collections::BTreeMap;
use tabula_codec::{format_date_only, write_rows, FieldType, ItemField, ScalarType, Value};

/// How a column renders its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatter {
    /// The field type's cell encoding.
    #[default]
    Default,
    /// Dates as `YYYY-MM-DD`.
    DateOnly,
    /// Numbers with a fixed count of decimals.
    Fixed(u8),
    /// Upper-cased text.
    Upper,
}

impl Formatter {
    fn apply(self, field: Option<&FieldDef>, value: &Value) -> String {
        match (self, value) {
            (Formatter::DateOnly, Value::Date(ms)) => format_date_only(*ms),
            (Formatter::Fixed(decimals), Value::Number(n)) => {
                format!("{n:.prec$}", prec = usize::from(decimals))
            }
            (Formatter::Upper, _) => default_cell(field, value).to_uppercase(),
            _ => default_cell(field, value),
        }
    }
}

fn default_cell(field: Option<&FieldDef>, value: &Value) -> String {
    match field {
        Some(def) => def.field_type.format_cell(value),
        None => value.to_display_string(),
    }
}

/// One exported column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Header text.
    pub header: String,
    /// Field name or dotted path; `id` is the entity id.
    pub field_path: String,
    /// Rendering.
    pub formatter: Formatter,
}

impl ColumnDescriptor {
    /// Creates a column with the default formatter.
    pub fn new(header: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            field_path: field_path.into(),
            formatter: Formatter::Default,
        }
    }

    /// Sets the formatter.
    #[must_use]
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }
}

/// Export settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Prepend an `id` column (ignored again on import).
    pub include_id: bool,
    /// Explicit columns; the schema's fields when `None`.
    pub columns: Option<Vec<ColumnDescriptor>>,
}

/// One column per schema field, headed by the field name.
pub fn default_columns(schema: &Schema, include_id: bool) -> Vec<ColumnDescriptor> {
    let id = include_id.then(|| ColumnDescriptor::new("id", "id"));
    id.into_iter()
        .chain(schema.fields.iter().map(|f| ColumnDescriptor::new(&f.name, &f.name)))
        .collect()
}

/// Renders entities as CSV text.
///
/// # Errors
///
/// Returns [`crate::CoreError::Codec`] if the CSV writer fails.
pub fn export_csv<'a, I>(schema: &Schema, entities: I, columns: &[ColumnDescriptor]) -> CoreResult<String>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let header: Vec<&str> = columns.iter().map(|c| c.header.as_str()).collect();
    let rows: Vec<Vec<String>> = entities
        .into_iter()
        .map(|entity| {
            columns
                .iter()
                .map(|c| {
                    let field = schema.field(&c.field_path);
                    c.formatter.apply(field, &entity.resolve_path(&c.field_path))
                })
                .collect()
        })
        .collect();
    Ok(write_rows(&header, &rows)?)
}

/// Suggested file name: `<kind>_<YYYY-MM-DD>.csv`.
pub fn export_filename(kind: &str, now_ms: i64) -> String {
    let date = DateTime::from_timestamp_millis(now_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    format!("{kind}_{date}.csv")
}

/// Renders an import template: the header row plus `rows` sample rows
/// (clamped to 1..=3) that import cleanly.
///
/// # Errors
///
/// Returns [`crate::CoreError::Codec`] if the CSV writer fails.
pub fn template_csv(schema: &Schema, rows: usize, now_ms: i64) -> CoreResult<String> {
    let header: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
    let samples: Vec<Vec<String>> = (0..rows.clamp(1, 3))
        .map(|i| {
            schema
                .fields
                .iter()
                .map(|f| f.field_type.format_cell(&sample_value(f, i, now_ms)))
                .collect()
        })
        .collect();
    Ok(write_rows(&header, &samples)?)
}

#[allow(clippy::cast_precision_loss)]
fn sample_value(field: &FieldDef, row: usize, now_ms: i64) -> Value {
    if let Some(default) = field.default.as_ref().filter(|d| !d.is_null()) {
        return default.clone();
    }
    let n = row + 1;
    match &field.field_type {
        FieldType::Text => Value::Text(format!("Sample {} {n}", field.name)),
        FieldType::Number => Value::Number((n * 10) as f64),
        FieldType::Bool => Value::Bool(row % 2 == 0),
        FieldType::Date => Value::Date(now_ms),
        FieldType::Enum { values } => values
            .get(row % values.len().max(1))
            .map_or(Value::Null, |v| Value::from(v.as_str())),
        FieldType::List { item_fields } => Value::List(vec![sample_item(item_fields, n, now_ms)]),
        FieldType::Record => Value::Record(BTreeMap::new()),
        FieldType::Reference { .. } => Value::Null,
    }
}

#[allow(clippy::cast_precision_loss)]
fn sample_item(item_fields: &[ItemField], n: usize, now_ms: i64) -> Value {
    if item_fields.is_empty() {
        return Value::Text(format!("item{n}"));
    }
    let record = item_fields
        .iter()
        .map(|f| {
            let value = match f.kind {
                ScalarType::Text => Value::Text(format!("{}{n}", f.name)),
                ScalarType::Number => Value::Number(n as f64),
                ScalarType::Bool => Value::Bool(true),
                ScalarType::Date => Value::Date(now_ms),
            };
            (f.name.clone(), value)
        })
        .collect();
    Value::Record(record)
}
