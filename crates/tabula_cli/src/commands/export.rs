//! Export command implementation.

use super::{write_output, CommandResult};
use std::io::Write;
use std::path::Path;
use tabula_core::tabular::ExportOptions;
use tabula_core::Workspace;

/// Runs the export command.
pub fn run<W: Write>(
    workspace: &Workspace,
    collection: &str,
    target: Option<&Path>,
    include_id: bool,
    out: &mut W,
) -> CommandResult {
    let options = ExportOptions {
        include_id,
        columns: None,
    };
    let csv = workspace.export_csv(collection, &options)?;
    let rows = workspace.list(collection)?.len();

    if let Some(file) = write_output(&csv, target, &workspace.export_filename(collection), out)? {
        writeln!(out, "Exported {rows} {collection} to {}", file.display())?;
    }
    Ok(())
}
