//! Inspect command implementation.

use super::CommandResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tabula_core::Workspace;

/// Workspace inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Snapshot key prefix.
    pub app_name: String,
    /// Per-collection summaries in registration order.
    pub collections: Vec<CollectionSummary>,
}

/// Summary of a single collection.
#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    /// Collection name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Number of entities.
    pub entity_count: usize,
    /// Field names with their declared types.
    pub fields: Vec<(String, String)>,
    /// Per enum field, entities per value.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub enum_counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// Per number field, the column total.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub numeric_sums: BTreeMap<String, f64>,
}

/// Runs the inspect command.
pub fn run<W: Write>(workspace: &Workspace, format: &str, out: &mut W) -> CommandResult {
    let result = inspect(workspace)?;
    match format {
        "json" => writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?,
        _ => print_text_output(&result, out)?,
    }
    Ok(())
}

fn inspect(workspace: &Workspace) -> CommandResult<InspectResult> {
    let mut collections = Vec::new();
    for name in workspace.collections() {
        let schema = workspace.schema(name)?;
        let stats = workspace.stats(name)?;
        collections.push(CollectionSummary {
            name: name.to_string(),
            label: schema.display_name().to_string(),
            entity_count: stats.total,
            fields: schema
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.field_type.name().to_string()))
                .collect(),
            enum_counts: stats.enum_counts,
            numeric_sums: stats.numeric_sums,
        });
    }
    Ok(InspectResult {
        app_name: workspace.config().app_name.clone(),
        collections,
    })
}

fn print_text_output<W: Write>(result: &InspectResult, out: &mut W) -> CommandResult {
    writeln!(out, "Tabula Workspace Inspection")?;
    writeln!(out, "===========================")?;
    writeln!(out)?;
    writeln!(out, "App name: {}", result.app_name)?;

    for c in &result.collections {
        writeln!(out)?;
        writeln!(out, "{} ({}): {} entities", c.name, c.label, c.entity_count)?;
        for (field, kind) in &c.fields {
            writeln!(out, "  {field:<20} {kind}")?;
        }
        for (field, counts) in &c.enum_counts {
            let parts: Vec<String> = counts.iter().map(|(v, n)| format!("{v}={n}")).collect();
            writeln!(out, "  {field} counts: {}", parts.join(", "))?;
        }
        for (field, sum) in &c.numeric_sums {
            writeln!(out, "  {field} total: {sum}")?;
        }
    }
    Ok(())
}
