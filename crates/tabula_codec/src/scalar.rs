//! Scalar parsing and formatting.
//!
//! These helpers are locale-agnostic: numbers always use `.` as the
//! decimal separator and dates are ISO-8601, interpreted as UTC when no
//! offset is given.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parses a number.
///
/// Surrounding whitespace, one leading currency symbol (`$`, `€`, `£`,
/// `¥`) and `,` grouping separators are ignored. Returns `None` for
/// anything else that does not parse, and for NaN or infinities.
pub fn parse_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest.trim_start()),
        None => ("", trimmed),
    };
    let rest = rest
        .strip_prefix(['$', '€', '£', '¥'])
        .unwrap_or(rest)
        .trim_start();
    if rest.is_empty() {
        return None;
    }

    let cleaned: String = format!("{sign}{rest}")
        .chars()
        .filter(|c| *c != ',')
        .collect();

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Parses an ISO-8601 date or date-time into epoch milliseconds.
///
/// Accepts RFC 3339 timestamps, offset-less date-times (taken as UTC)
/// and plain dates (midnight UTC).
pub fn parse_date(input: &str) -> Option<i64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc().timestamp_millis());
        }
    }

    None
}

/// Formats epoch milliseconds as ISO-8601.
///
/// Midnight UTC renders as a plain date (`2024-03-01`); any other instant
/// renders as an RFC 3339 timestamp with millisecond precision.
pub fn format_date(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) if ms.rem_euclid(MILLIS_PER_DAY) == 0 && dt.nanosecond() == 0 => {
            dt.format("%Y-%m-%d").to_string()
        }
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ms.to_string(),
    }
}

/// Formats epoch milliseconds as a plain `YYYY-MM-DD` date.
pub fn format_date_only(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Parses a boolean strictly: `true`/`false` in any case.
pub fn parse_bool_strict(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parses a boolean leniently: `true`, `yes`, `y` and `1` are true,
/// everything else is false.
pub fn parse_bool(input: &str) -> bool {
    matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// Normalizes a label for fuzzy matching: lower-case, alphanumerics only.
///
/// `"In Transit"`, `"in_transit"` and `"IN-TRANSIT"` all normalize to
/// `"intransit"`.
pub fn normalize_label(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Finds the declared enum value matching `input`, ignoring case and
/// separators.
pub fn match_enum<'a>(values: &'a [String], input: &str) -> Option<&'a str> {
    let wanted = normalize_label(input);
    if wanted.is_empty() {
        return None;
    }
    values
        .iter()
        .find(|v| normalize_label(v) == wanted)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn formatted_numbers_parse_back(cents in -10_000_000_000i64..10_000_000_000) {
            let n = cents as f64 / 100.0;
            prop_assert_eq!(parse_number(&format_number(n)), Some(n));
        }

        #[test]
        fn formatted_dates_parse_back(ms in 0i64..4_102_444_800_000) {
            prop_assert_eq!(parse_date(&format_date(ms)), Some(ms));
        }
    }

    #[test]
    fn numbers_plain_and_decorated() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" 12.50 "), Some(12.5));
        assert_eq!(parse_number("$1,200.75"), Some(1200.75));
        assert_eq!(parse_number("-$5"), Some(-5.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
    }

    #[test]
    fn numbers_rejected() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("$"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn dates_in_several_shapes() {
        let day = parse_date("2024-03-01").unwrap();
        assert_eq!(day, 1_709_251_200_000);
        assert_eq!(parse_date("2024/03/01"), Some(day));
        assert_eq!(parse_date("2024-03-01T00:00:00Z"), Some(day));
        assert_eq!(parse_date("2024-03-01T00:00:00"), Some(day));
        assert_eq!(parse_date("2024-03-01T02:00:00+02:00"), Some(day));
        assert_eq!(parse_date("2024-03-01 10:30"), Some(day + 37_800_000));
    }

    #[test]
    fn dates_rejected() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-40"), None);
    }

    #[test]
    fn date_formatting() {
        let day = parse_date("2024-03-01").unwrap();
        assert_eq!(format_date(day), "2024-03-01");
        assert_eq!(format_date(day + 1_500), "2024-03-01T00:00:01.500Z");
        assert_eq!(format_date_only(day + 1_500), "2024-03-01");
        assert_eq!(parse_date(&format_date(day + 1_500)), Some(day + 1_500));
    }

    #[test]
    fn booleans() {
        assert!(parse_bool("Yes"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool(""));
        assert_eq!(parse_bool_strict("TRUE"), Some(true));
        assert_eq!(parse_bool_strict("yes"), None);
    }

    #[test]
    fn enum_matching_ignores_case_and_separators() {
        let values = vec!["pending".to_string(), "in_transit".to_string()];
        assert_eq!(match_enum(&values, "In Transit"), Some("in_transit"));
        assert_eq!(match_enum(&values, "IN-TRANSIT"), Some("in_transit"));
        assert_eq!(match_enum(&values, "PENDING"), Some("pending"));
        assert_eq!(match_enum(&values, "delivered"), None);
        assert_eq!(match_enum(&values, "  "), None);
    }
}
