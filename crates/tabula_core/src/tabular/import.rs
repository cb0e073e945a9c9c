//! CSV import.

use crate::collection::EntityStore;
use crate::entity::{EntityDraft, EntityId};
use crate::schema::{FieldDef, Schema};
use tabula_codec::{normalize_label, read_rows, FieldType};
use tracing::debug;

/// Which CSV column feeds which schema field.
///
/// Resolved once per import from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// `(field index in schema, column index)` pairs in schema order.
    columns: Vec<(usize, usize)>,
    min_fields: usize,
    missing_required: Vec<String>,
}

impl ColumnMapping {
    /// Maps `headers` onto the fields of `schema`.
    ///
    /// Headers and field names are compared after normalization
    /// (lower-case, alphanumerics only). A header that normalizes to `id`
    /// is set aside. The first pass claims exact matches; the second gives
    /// each remaining field the first unclaimed header containing its
    /// name, so `"Total Amount (USD)"` feeds `amount`.
    pub fn resolve(schema: &Schema, headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_label(h)).collect();
        let mut claimed: Vec<bool> = normalized.iter().map(|h| h == "id" || h.is_empty()).collect();
        let mut assigned: Vec<Option<usize>> = vec![None; schema.fields.len()];
        let keys: Vec<String> = schema.fields.iter().map(|f| normalize_label(&f.name)).collect();

        for (fi, key) in keys.iter().enumerate() {
            if let Some(col) = (0..normalized.len()).find(|&c| !claimed[c] && normalized[c] == *key) {
                claimed[col] = true;
                assigned[fi] = Some(col);
            }
        }
        for (fi, key) in keys.iter().enumerate() {
            if assigned[fi].is_some() || key.is_empty() {
                continue;
            }
            if let Some(col) = (0..normalized.len()).find(|&c| !claimed[c] && normalized[c].contains(key.as_str())) {
                claimed[col] = true;
                assigned[fi] = Some(col);
            }
        }

        let columns: Vec<(usize, usize)> = assigned
            .iter()
            .enumerate()
            .filter_map(|(fi, col)| col.map(|c| (fi, c)))
            .collect();
        let min_fields = columns
            .iter()
            .filter(|(fi, _)| schema.fields[*fi].required)
            .map(|(_, c)| c + 1)
            .max()
            .unwrap_or(1);
        let missing_required = schema
            .fields
            .iter()
            .zip(&assigned)
            .filter(|(f, col)| f.required && col.is_none())
            .map(|(f, _)| f.name.clone())
            .collect();

        Self {
            columns,
            min_fields,
            missing_required,
        }
    }

    /// Column feeding `field`, if any.
    pub fn column_for(&self, schema: &Schema, field: &str) -> Option<usize> {
        let fi = schema.field_index(field)?;
        self.columns.iter().find(|(f, _)| *f == fi).map(|(_, c)| *c)
    }

    /// Fewest fields a row may have.
    pub fn min_fields(&self) -> usize {
        self.min_fields
    }

    /// Required fields no header resolved to.
    pub fn missing_required(&self) -> &[String] {
        &self.missing_required
    }

    fn draft(&self, schema: &Schema, cells: &[String], now_ms: i64) -> EntityDraft {
        let mut draft = EntityDraft::new();
        for &(fi, col) in &self.columns {
            let def = &schema.fields[fi];
            let Some(cell) = cells.get(col) else {
                continue;
            };
            if let Some(value) = cell_value(def, cell, now_ms) {
                draft.fields.insert(def.name.clone(), value);
            }
        }
        draft
    }
}

/// Value for one cell, or `None` to let the store apply the default.
fn cell_value(def: &FieldDef, cell: &str, now_ms: i64) -> Option<tabula_codec::Value> {
    if cell.trim().is_empty() {
        // Optional fields stay `Null` so an exported blank reads back as blank.
        if def.default.is_some() || !def.required {
            return None;
        }
        return match def.field_type {
            FieldType::Text | FieldType::Reference { .. } | FieldType::Date => None,
            _ => Some(def.field_type.parse_cell(cell, now_ms)),
        };
    }
    Some(def.field_type.parse_cell(cell, now_ms))
}

/// A row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based line number in the source text.
    pub line: u64,
    /// Why the row was skipped.
    pub reason: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows created as entities.
    pub imported: usize,
    /// Rows skipped.
    pub failed: usize,
    /// Details of the skipped rows.
    pub failures: Vec<RowFailure>,
    /// Ids of the created entities, in row order.
    pub created: Vec<EntityId>,
}

impl ImportReport {
    fn fail(&mut self, line: u64, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(line, reason = %reason, "skipped import row");
        self.failed += 1;
        self.failures.push(RowFailure { line, reason });
    }
}

/// Imports CSV text into `store`.
///
/// The first non-blank record is the header. Every following record
/// either becomes a new entity with a fresh id or is counted as a
/// failure; the import itself never fails.
pub fn import_csv(store: &mut EntityStore, text: &str, now_ms: i64) -> ImportReport {
    let mut report = ImportReport::default();
    let mut rows = read_rows(text).into_iter();

    let headers = loop {
        match rows.next() {
            Some(row) => match row.fields {
                Ok(fields) => break fields,
                Err(reason) => report.fail(row.line, reason),
            },
            None => return report,
        }
    };

    let schema = store.schema().clone();
    let mapping = ColumnMapping::resolve(&schema, &headers);
    let missing = (!mapping.missing_required().is_empty())
        .then(|| format!("missing required column(s): {}", mapping.missing_required().join(", ")));

    for row in rows {
        let cells = match row.fields {
            Ok(cells) => cells,
            Err(reason) => {
                report.fail(row.line, reason);
                continue;
            }
        };
        if let Some(reason) = &missing {
            report.fail(row.line, reason.clone());
            continue;
        }
        if cells.len() < mapping.min_fields() {
            report.fail(
                row.line,
                format!("expected at least {} fields, found {}", mapping.min_fields(), cells.len()),
            );
            continue;
        }

        match store.create(mapping.draft(&schema, &cells, now_ms)) {
            Ok(entity) => {
                report.imported += 1;
                report.created.push(entity.id().clone());
            }
            Err(e) => report.fail(row.line, e.to_string()),
        }
    }
    report
}
