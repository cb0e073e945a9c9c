//! Nested list cell encoding.
//!
//! A list cell holds items separated by `|`. When the list declares item
//! fields, each item is its field values in declared order separated by
//! `,`, so an order's line items read `bolt,3,0.25|nut,10,0.1`.
//!
//! A `,`, `|` or `\` inside a value is written with a leading `\`, so
//! `Bolt, M8` encodes as `Bolt\, M8`.

use crate::field_type::{FieldType, ItemField};
use crate::scalar::parse_date;
use crate::value::Value;
use std::collections::BTreeMap;

const ITEM_SEPARATOR: char = '|';
const FIELD_SEPARATOR: char = ',';
const ESCAPE: char = '\\';

/// Encodes list items into a single cell.
pub fn encode_list(items: &[Value], item_fields: &[ItemField]) -> String {
    items
        .iter()
        .map(|item| encode_item(item, item_fields))
        .collect::<Vec<_>>()
        .join(&ITEM_SEPARATOR.to_string())
}

fn encode_item(item: &Value, item_fields: &[ItemField]) -> String {
    match item {
        Value::Record(map) if !item_fields.is_empty() => item_fields
            .iter()
            .map(|f| {
                map.get(&f.name)
                    .map(|v| escape(&v.to_display_string()))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(&FIELD_SEPARATOR.to_string()),
        other => escape(&other.to_display_string()),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, ITEM_SEPARATOR | FIELD_SEPARATOR | ESCAPE) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Splits on unescaped `separator`, keeping escape sequences in the parts.
fn split_unescaped(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == separator {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Decodes a list cell.
///
/// Empty segments are skipped. Item fields beyond the declared ones are
/// ignored; missing trailing fields decode through the scalar fallbacks
/// (`0` for numbers, `Null` for text and dates).
pub fn decode_list(cell: &str, item_fields: &[ItemField]) -> Vec<Value> {
    split_unescaped(cell, ITEM_SEPARATOR)
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| decode_item(segment, item_fields))
        .collect()
}

fn decode_item(segment: &str, item_fields: &[ItemField]) -> Value {
    if item_fields.is_empty() {
        return Value::Text(unescape(segment));
    }

    let mut parts = split_unescaped(segment, FIELD_SEPARATOR).into_iter();
    let mut map = BTreeMap::new();
    for field in item_fields {
        let raw = unescape(parts.next().unwrap_or("").trim());
        let raw = raw.as_str();
        let value = match field.kind.field_type() {
            // Item dates have no "now" fallback; an unparseable date is absent.
            FieldType::Date => parse_date(raw).map_or(Value::Null, Value::Date),
            other => other.parse_cell(raw, 0),
        };
        map.insert(field.name.clone(), value);
    }
    Value::Record(map)
}
