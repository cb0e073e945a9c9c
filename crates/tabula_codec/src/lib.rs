//! # Tabula Codec
//!
//! Dynamic values and their text encodings for Tabula.
//!
//! This crate provides:
//! - [`Value`], the dynamic type every entity field holds
//! - [`FieldType`], the declared type a schema assigns to a field
//! - Strict coercion (for validation and snapshot loading) and lenient
//!   cell parsing (for CSV import, with per-type fallbacks)
//! - JSON conversion used by snapshots
//! - Quote-aware CSV reading and always-quoted CSV writing
//!
//! ## Usage
//!
//! ```
//! use tabula_codec::{FieldType, Value};
//!
//! let amount = FieldType::Number.coerce(&Value::from("42")).unwrap();
//! assert_eq!(amount, Value::Number(42.0));
//!
//! let status = FieldType::enumeration(["pending", "in_transit"]);
//! assert_eq!(status.parse_cell("In Transit", 0), Value::from("in_transit"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod field_type;
mod json;
mod list;
mod scalar;
mod table;
mod value;

pub use error::{CodecError, CodecResult};
pub use field_type::{FieldType, ItemField, ScalarType};
pub use list::{decode_list, encode_list};
pub use scalar::{
    format_date, format_date_only, format_number, match_enum, normalize_label, parse_bool,
    parse_bool_strict, parse_date, parse_number,
};
pub use table::{read_rows, write_rows, RawRow};
pub use value::{compare_text, Value};
