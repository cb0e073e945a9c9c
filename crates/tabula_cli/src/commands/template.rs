//! Template command implementation.

use super::{write_output, CommandResult};
use std::io::Write;
use std::path::Path;
use tabula_core::Workspace;

/// Runs the template command.
pub fn run<W: Write>(
    workspace: &Workspace,
    collection: &str,
    rows: Option<usize>,
    target: Option<&Path>,
    out: &mut W,
) -> CommandResult {
    let csv = match rows {
        Some(rows) => workspace.template_csv_with_rows(collection, rows)?,
        None => workspace.template_csv(collection)?,
    };
    let name = format!("{collection}_template.csv");
    if let Some(file) = write_output(&csv, target, &name, out)? {
        writeln!(out, "Wrote template to {}", file.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{fixtures, open_workspace};
    use tempfile::tempdir;

    #[test]
    fn template_imports_cleanly() {
        let dir = tempdir().unwrap();
        let schema = fixtures::schema_file(dir.path());
        let mut workspace = open_workspace(&dir.path().join("data"), &schema).unwrap();

        let mut sink = Vec::new();
        run(&workspace, "shipments", Some(3), Some(dir.path()), &mut sink).unwrap();
        let file = dir.path().join("shipments_template.csv");
        assert_eq!(std::fs::read_to_string(&file).unwrap().lines().count(), 4);

        let report = workspace.import_path("shipments", &file).unwrap();
        assert_eq!((report.imported, report.failed), (3, 0));
    }
}
