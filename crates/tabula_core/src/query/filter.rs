//! Filter predicates.

use crate::entity::Entity;
use std::collections::BTreeMap;
use tabula_codec::{parse_date, parse_number, Value};

/// Inclusive bounds on a numeric or date field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeFilter {
    /// Lower bound, if any.
    pub min: Option<Value>,
    /// Upper bound, if any.
    pub max: Option<Value>,
}

impl RangeFilter {
    /// Creates a range with both bounds optional.
    pub fn new(min: Option<Value>, max: Option<Value>) -> Self {
        Self { min, max }
    }

    /// Returns true if neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        bound(self.min.as_ref()).is_none() && bound(self.max.as_ref()).is_none()
    }

    /// Tests a value against the bounds.
    ///
    /// A value with no numeric reading fails as soon as either bound is
    /// set.
    pub fn contains(&self, value: &Value) -> bool {
        let min = bound(self.min.as_ref());
        let max = bound(self.max.as_ref());
        if min.is_none() && max.is_none() {
            return true;
        }
        let Some(v) = value.as_epoch() else {
            return false;
        };
        min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
    }
}

/// Reads a bound on the epoch axis. Text bounds parse as a number first,
/// then as an ISO date.
#[allow(clippy::cast_precision_loss)]
fn bound(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Text(s) => parse_number(s).or_else(|| parse_date(s).map(|ms| ms as f64)),
        other => other.as_epoch(),
    }
}

/// Search, exact and range constraints over one collection.
///
/// An empty filter matches everything. The three stages are conjunctive;
/// search is disjunctive over its fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Free-text term, matched case-insensitively as a substring.
    pub search_term: String,
    /// Fields the search term is matched against.
    pub search_fields: Vec<String>,
    /// Field values entities must equal. Blank values are ignored.
    pub exact_filters: BTreeMap<String, Value>,
    /// Bounds entities must fall within.
    pub range_filters: BTreeMap<String, RangeFilter>,
}

impl FilterSpec {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search term and fields.
    #[must_use]
    pub fn search<I, S>(mut self, term: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_term = term.into();
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an exact-match constraint.
    #[must_use]
    pub fn exact(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exact_filters.insert(field.into(), value.into());
        self
    }

    /// Adds a range constraint.
    #[must_use]
    pub fn range(
        mut self,
        field: impl Into<String>,
        min: Option<Value>,
        max: Option<Value>,
    ) -> Self {
        self.range_filters.insert(field.into(), RangeFilter::new(min, max));
        self
    }

    /// Returns true if the filter constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty()
            && self.exact_filters.values().all(Value::is_blank)
            && self.range_filters.values().all(RangeFilter::is_unbounded)
    }

    /// Tests an entity against every stage.
    pub fn matches(&self, entity: &Entity) -> bool {
        self.matches_search(entity) && self.matches_exact(entity) && self.matches_range(entity)
    }

    /// Search stage.
    pub fn matches_search(&self, entity: &Entity) -> bool {
        let term = self.search_term.trim();
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.search_fields.iter().any(|field| {
            entity
                .resolve_path(field)
                .to_display_string()
                .to_lowercase()
                .contains(&needle)
        })
    }

    /// Exact stage.
    pub fn matches_exact(&self, entity: &Entity) -> bool {
        self.exact_filters
            .iter()
            .filter(|(_, wanted)| !wanted.is_blank())
            .all(|(field, wanted)| entity.value(field).filter_eq(wanted))
    }

    /// Range stage.
    pub fn matches_range(&self, entity: &Entity) -> bool {
        self.range_filters
            .iter()
            .all(|(field, range)| range.contains(entity.value(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Fields};

    fn entity(id: &str, pairs: &[(&str, Value)]) -> Entity {
        let fields: Fields = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        Entity::new(EntityId::from(id), fields)
    }

    #[test]
    fn empty_spec_matches_everything() {
        let spec = FilterSpec::new();
        assert!(spec.is_empty());
        assert!(spec.matches(&entity("1", &[])));
    }

    #[test]
    fn search_is_case_insensitive_and_any_field() {
        let e = entity("1", &[("name", Value::from("Acme Freight")), ("city", Value::from("Oslo"))]);
        assert!(FilterSpec::new().search("freight", ["name"]).matches(&e));
        assert!(FilterSpec::new().search("OSLO", ["name", "city"]).matches(&e));
        assert!(!FilterSpec::new().search("oslo", ["name"]).matches(&e));
        assert!(!FilterSpec::new().search("x", Vec::<String>::new()).matches(&e));
        assert!(FilterSpec::new().search("  ", ["name"]).matches(&e));
    }

    #[test]
    fn search_matches_numbers_by_display() {
        let e = entity("1", &[("amount", Value::Number(1250.0))]);
        assert!(FilterSpec::new().search("125", ["amount"]).matches(&e));
    }

    #[test]
    fn exact_filters_ignore_blank_values() {
        let e = entity("1", &[("status", Value::from("pending"))]);
        assert!(FilterSpec::new().exact("status", "pending").matches(&e));
        assert!(!FilterSpec::new().exact("status", "approved").matches(&e));
        assert!(FilterSpec::new().exact("status", "").matches(&e));
        assert!(FilterSpec::new().exact("status", Value::Null).matches(&e));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let e = entity("1", &[("amount", Value::Number(100.0))]);
        let within = |min: Option<Value>, max: Option<Value>| {
            FilterSpec::new().range("amount", min, max).matches(&e)
        };
        assert!(within(Some(Value::from(100)), None));
        assert!(within(None, Some(Value::from(100))));
        assert!(within(Some(Value::from("50")), Some(Value::from("$150"))));
        assert!(!within(Some(Value::from(101)), None));
        assert!(!within(None, Some(Value::from(99.5))));
        assert!(within(None, None));
    }

    #[test]
    fn range_on_dates_accepts_iso_bounds() {
        let e = entity("1", &[("due", Value::Date(parse_date("2024-03-10").unwrap()))]);
        let spec = FilterSpec::new().range(
            "due",
            Some(Value::from("2024-03-01")),
            Some(Value::from("2024-03-31")),
        );
        assert!(spec.matches(&e));
        let spec = FilterSpec::new().range("due", Some(Value::from("2024-04-01")), None);
        assert!(!spec.matches(&e));
    }

    #[test]
    fn missing_value_fails_active_range() {
        let e = entity("1", &[("amount", Value::Null)]);
        assert!(!FilterSpec::new().range("amount", Some(Value::from(0)), None).matches(&e));
        assert!(FilterSpec::new().range("amount", None, None).matches(&e));
    }
}
