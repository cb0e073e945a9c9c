//! Import command implementation.

use super::CommandResult;
use std::io::Write;
use std::path::Path;
use tabula_core::Workspace;

/// Runs the import command.
pub fn run<W: Write>(
    workspace: &mut Workspace,
    collection: &str,
    file: &Path,
    out: &mut W,
) -> CommandResult {
    let report = workspace.import_path(collection, file)?;
    workspace.flush();

    if let Some(notification) = workspace.notification() {
        writeln!(out, "{notification}")?;
    }
    for failure in &report.failures {
        writeln!(out, "  line {}: {}", failure.line, failure.reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{fixtures, open_workspace};
    use tempfile::tempdir;

    #[test]
    fn imports_and_persists() {
        let dir = tempdir().unwrap();
        let schema = fixtures::schema_file(dir.path());
        let data = dir.path().join("data");
        let csv = dir.path().join("shipments.csv");
        std::fs::write(&csv, "Reference,Weight (kg)\nS-1,12\n,4\nS-3,\n").unwrap();

        let mut sink = Vec::new();
        {
            let mut workspace = open_workspace(&data, &schema).unwrap();
            run(&mut workspace, "shipments", &csv, &mut sink).unwrap();
        }
        let printed = String::from_utf8(sink).unwrap();
        assert!(printed.starts_with("[error] Imported 2 shipments, 1 row(s) skipped"));
        assert!(printed.contains("line 3:"));

        let reopened = open_workspace(&data, &schema).unwrap();
        let rows = reopened.list("shipments").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("status"), Some("unassigned"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let schema = fixtures::schema_file(dir.path());
        let mut workspace = open_workspace(&dir.path().join("data"), &schema).unwrap();
        let mut sink = Vec::new();
        assert!(run(&mut workspace, "shipments", &dir.path().join("none.csv"), &mut sink).is_err());
    }
}
