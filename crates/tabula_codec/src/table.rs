//! Quote-aware CSV reading and writing.
//!
//! Writing always quotes every field and doubles embedded quotes, so
//! commas, quotes and newlines inside values survive. Reading accepts
//! both quoted and bare fields and tolerates rows of differing length;
//! the caller decides what a short row means.

use crate::error::{CodecError, CodecResult};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

/// One record read from CSV text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number where the record starts.
    pub line: u64,
    /// The record's fields, or why the record could not be read.
    pub fields: Result<Vec<String>, String>,
}

/// Writes a header row followed by data rows, every field quoted.
///
/// Rows are terminated by `\n`.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn write_rows<H, R>(header: &[H], rows: &[R]) -> CodecResult<String>
where
    H: AsRef<str>,
    R: AsRef<[String]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(header.iter().map(|h| AsRef::<str>::as_ref(h)))?;
    for row in rows {
        writer.write_record(AsRef::<[String]>::as_ref(row))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CodecError::csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CodecError::csv(e.to_string()))
}

/// Reads every record from CSV text, header included.
///
/// Blank lines produce no records. Fields are trimmed of surrounding
/// whitespace. A record the reader cannot parse is
/// returned with an error message instead of aborting the whole read.
pub fn read_rows(text: &str) -> Vec<RawRow> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let fallback_line = index as u64 + 1;
        match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, csv::Position::line);
                let fields: Vec<String> = record.iter().map(str::to_string).collect();
                if fields.iter().all(String::is_empty) {
                    continue;
                }
                rows.push(RawRow {
                    line,
                    fields: Ok(fields),
                });
            }
            Err(e) => {
                let line = e
                    .position()
                    .map_or(fallback_line, csv::Position::line);
                rows.push(RawRow {
                    line,
                    fields: Err(e.to_string()),
                });
            }
        }
    }
    rows
}
