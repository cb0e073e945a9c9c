//! Delete command implementation.

use super::CommandResult;
use std::io::Write;
use tabula_core::{EntityId, Workspace};

/// Runs the delete command.
pub fn run<W: Write>(
    workspace: &mut Workspace,
    collection: &str,
    id: &str,
    out: &mut W,
) -> CommandResult {
    let id = EntityId::parse(id).ok_or("Entity id must not be blank")?;
    workspace.remove(collection, &id)?;
    workspace.flush();

    if let Some(notification) = workspace.notification() {
        writeln!(out, "{notification}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{fixtures, open_workspace};
    use tabula_core::{EntityDraft, Value};
    use tempfile::tempdir;

    #[test]
    fn delete_detaches_and_persists() {
        let dir = tempdir().unwrap();
        let schema = fixtures::schema_file(dir.path());
        let data = dir.path().join("data");

        let mut sink = Vec::new();
        {
            let mut workspace = open_workspace(&data, &schema).unwrap();
            workspace
                .create("vehicles", EntityDraft::new().with_id("v1").set("plate", "AB-1"))
                .unwrap();
            workspace
                .create(
                    "shipments",
                    EntityDraft::new()
                        .with_id("s1")
                        .set("reference", "S-1")
                        .set("status", "assigned")
                        .set("vehicle_id", "v1"),
                )
                .unwrap();
            run(&mut workspace, "vehicles", "v1", &mut sink).unwrap();
        }
        assert_eq!(
            String::from_utf8(sink).unwrap().trim(),
            "[success] Vehicle deleted, 1 reference(s) cleared"
        );

        let reopened = open_workspace(&data, &schema).unwrap();
        assert!(reopened.list("vehicles").unwrap().is_empty());
        let s1 = reopened.get("shipments", &EntityId::from("s1")).unwrap();
        assert_eq!(s1.value("vehicle_id"), &Value::Null);
        assert_eq!(s1.text("status"), Some("unassigned"));
    }

    #[test]
    fn unknown_id_is_an_error() {
        let dir = tempdir().unwrap();
        let schema = fixtures::schema_file(dir.path());
        let mut workspace = open_workspace(&dir.path().join("data"), &schema).unwrap();
        let mut sink = Vec::new();
        assert!(run(&mut workspace, "vehicles", "ghost", &mut sink).is_err());
        assert!(run(&mut workspace, "vehicles", "  ", &mut sink).is_err());
    }
}
