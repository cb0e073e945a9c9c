//! List command implementation.

use super::CommandResult;
use std::io::Write;
use tabula_core::{Entity, Schema, Value, Workspace};

/// View state requested on the command line.
#[derive(Debug, Default)]
pub struct ListQuery {
    /// Free-text search term.
    pub search: Option<String>,
    /// Sort requests, applied in order like header clicks.
    pub sort: Vec<String>,
    /// `field=value` exact filters.
    pub filters: Vec<String>,
    /// `field=min..max` range filters.
    pub ranges: Vec<String>,
}

/// Runs the list command.
pub fn run<W: Write>(
    workspace: &mut Workspace,
    collection: &str,
    query: &ListQuery,
    format: &str,
    out: &mut W,
) -> CommandResult {
    if let Some(term) = &query.search {
        workspace.set_search_term(collection, term.as_str())?;
    }
    for field in &query.sort {
        workspace.request_sort(collection, field)?;
    }
    for filter in &query.filters {
        let (field, value) = split_assignment(filter)?;
        workspace.set_exact_filter(collection, field, value)?;
    }
    for range in &query.ranges {
        let (field, bounds) = split_assignment(range)?;
        let (min, max) = parse_bounds(bounds)?;
        workspace.set_range_filter(collection, field, min, max)?;
    }

    let schema = workspace.schema(collection)?;
    let rows = workspace.view(collection)?;
    let total = workspace.list(collection)?.len();

    match format {
        "json" => {
            let array: Vec<serde_json::Value> = rows.iter().map(|e| entity_json(e)).collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&array)?)?;
        }
        _ => print_table(schema, &rows, total, out)?,
    }
    Ok(())
}

fn split_assignment(arg: &str) -> CommandResult<(&str, &str)> {
    arg.split_once('=')
        .map(|(field, value)| (field.trim(), value.trim()))
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| format!("Expected field=value, got {arg:?}").into())
}

fn parse_bounds(bounds: &str) -> CommandResult<(Option<Value>, Option<Value>)> {
    let (min, max) = bounds
        .split_once("..")
        .ok_or_else(|| format!("Expected min..max, got {bounds:?}"))?;
    let bound = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| Value::from(s))
    };
    Ok((bound(min), bound(max)))
}

fn entity_json(entity: &Entity) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    object.insert("id".to_string(), entity.id().to_string().into());
    for (name, value) in entity.fields() {
        object.insert(name.clone(), value.to_json());
    }
    serde_json::Value::Object(object)
}

fn print_table<W: Write>(schema: &Schema, rows: &[&Entity], total: usize, out: &mut W) -> CommandResult {
    let mut header = vec!["id".to_string()];
    header.extend(schema.fields.iter().map(|f| f.name.clone()));
    writeln!(out, "{}", header.join("\t"))?;

    for entity in rows {
        let mut cells = vec![entity.id().to_string()];
        cells.extend(
            schema
                .fields
                .iter()
                .map(|f| f.field_type.format_cell(entity.value(&f.name))),
        );
        writeln!(out, "{}", cells.join("\t"))?;
    }
    writeln!(out)?;
    writeln!(out, "{} of {} {} shown", rows.len(), total, schema.name)?;
    Ok(())
}
