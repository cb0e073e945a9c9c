//! Dynamic field value type.

use crate::scalar::{format_date, format_number};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A dynamic field value.
///
/// Every entity field holds a `Value`. The schema decides which variant a
/// field may hold; `Value` itself carries no schema knowledge.
///
/// Dates are stored as milliseconds since the Unix epoch (UTC) so that
/// range filters and sorting compare them numerically.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text (also used for enum members and reference ids).
    Text(String),
    /// Point in time, milliseconds since the Unix epoch.
    Date(i64),
    /// Ordered list of values (line items, tags).
    List(Vec<Value>),
    /// Nested record with named fields.
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is null or text that is empty after trimming.
    ///
    /// Blank values count as missing for required fields and as "no
    /// constraint" for exact filters.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as a number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as epoch milliseconds, if it is a date.
    pub fn as_date(&self) -> Option<i64> {
        match self {
            Value::Date(ms) => Some(*ms),
            _ => None,
        }
    }

    /// Get this value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get this value as a record, if it is one.
    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Record(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the value on a numeric axis: numbers as-is, dates as epoch
    /// milliseconds. Used by range filters.
    pub fn as_epoch(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            #[allow(clippy::cast_precision_loss)]
            Value::Date(ms) => Some(*ms as f64),
            _ => None,
        }
    }

    /// Returns a short name for the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    /// Renders the value as plain text.
    ///
    /// This is the representation free-text search matches against and
    /// the default CSV cell content. Null renders as an empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Date(ms) => format_date(*ms),
            Value::List(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join("|"),
            Value::Record(map) => map
                .values()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Compares two non-null values for sorting.
    ///
    /// - Numbers compare numerically, dates by epoch difference, and a
    ///   number against a date on the shared epoch axis
    /// - Text compares with [`compare_text`]
    /// - Any other mix falls back to comparing display strings
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Number(_), Value::Date(_)) | (Value::Date(_), Value::Number(_)) => {
                let a = self.as_epoch().unwrap_or_default();
                let b = other.as_epoch().unwrap_or_default();
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => compare_text(a, b),
            _ => compare_text(&self.to_display_string(), &other.to_display_string()),
        }
    }

    /// Exact-filter equality.
    ///
    /// Text compares verbatim; numbers compare numerically; everything
    /// else (including mixed types such as a number field filtered by the
    /// text `"3"`) compares by display string.
    pub fn filter_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => self.to_display_string() == other.to_display_string(),
        }
    }
}

/// Locale-style text ordering.
///
/// Compares case-insensitively first, so `"apple" < "Banana" < "cherry"`,
/// then case-sensitively to keep the order total.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Record(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("   ").is_blank());
        assert!(!Value::from("x").is_blank());
        assert!(!Value::Number(0.0).is_blank());
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::Null.to_display_string(), "");
        assert_eq!(Value::Number(100.0).to_display_string(), "100");
        assert_eq!(Value::Number(12.5).to_display_string(), "12.5");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Date(0).to_display_string(), "1970-01-01");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::from("b")]).to_display_string(),
            "a|b"
        );
    }

    #[test]
    fn numbers_sort_numerically() {
        assert_eq!(Value::Number(9.0).sort_cmp(&Value::Number(10.0)), Ordering::Less);
        assert_eq!(Value::Number(50.0).sort_cmp(&Value::Number(50.0)), Ordering::Equal);
    }

    #[test]
    fn dates_sort_by_epoch() {
        assert_eq!(Value::Date(1_000).sort_cmp(&Value::Date(2_000)), Ordering::Less);
        assert_eq!(Value::Date(5).sort_cmp(&Value::Number(4.0)), Ordering::Greater);
    }

    #[test]
    fn text_sorts_case_insensitively() {
        assert_eq!(compare_text("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_text("Banana", "cherry"), Ordering::Less);
        assert_ne!(compare_text("a", "A"), Ordering::Equal);
    }

    #[test]
    fn filter_equality() {
        assert!(Value::from("pending").filter_eq(&Value::from("pending")));
        assert!(!Value::from("pending").filter_eq(&Value::from("Pending")));
        assert!(Value::Number(3.0).filter_eq(&Value::from("3")));
        assert!(Value::Bool(true).filter_eq(&Value::from("true")));
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some(2)), Value::Number(2.0));
    }
}
