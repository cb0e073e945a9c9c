//! Tabular (CSV) import and export.
//!
//! Export writes a header row plus one always-quoted row per entity.
//! Import maps header names onto schema fields once, then parses each row
//! independently: a bad row is counted and skipped, never applied in part.

mod export;
mod import;

pub use export::{
    default_columns, export_csv, export_filename, template_csv, ColumnDescriptor, ExportOptions,
    Formatter,
};
pub use import::{import_csv, ColumnMapping, ImportReport, RowFailure};
