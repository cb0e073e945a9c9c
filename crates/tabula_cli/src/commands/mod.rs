//! CLI command implementations.

pub mod delete;
pub mod export;
pub mod import;
pub mod inspect;
pub mod list;
pub mod template;

use std::io::Write;
use std::path::{Path, PathBuf};
use tabula_core::{SchemaSet, Workspace};

/// Result type shared by the commands.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Opens the workspace at `path` and registers every collection declared
/// in the schema file.
pub fn open_workspace(path: &Path, schema_path: &Path) -> CommandResult<Workspace> {
    let schemas = SchemaSet::from_path(schema_path)
        .map_err(|e| format!("Cannot load schema {}: {e}", schema_path.display()))?;
    if schemas.collections.is_empty() {
        return Err(format!("Schema {} declares no collections", schema_path.display()).into());
    }

    let mut workspace = Workspace::open(path)?;
    for schema in schemas.collections {
        workspace.register(schema)?;
    }
    Ok(workspace)
}

/// Writes `text` to `target`, or to `out` when no target is given.
///
/// A directory target receives `default_name` inside it.
pub(crate) fn write_output<W: Write>(
    text: &str,
    target: Option<&Path>,
    default_name: &str,
    out: &mut W,
) -> CommandResult<Option<PathBuf>> {
    let Some(target) = target else {
        out.write_all(text.as_bytes())?;
        return Ok(None);
    };
    let file = if target.is_dir() {
        target.join(default_name)
    } else {
        target.to_path_buf()
    };
    std::fs::write(&file, text)?;
    Ok(Some(file))
}
