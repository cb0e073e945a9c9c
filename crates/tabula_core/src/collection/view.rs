//! Per-collection view state.

use crate::entity::Entity;
use crate::query::{execute, FilterSpec, RangeFilter, SortSpec};
use crate::schema::Schema;
use tabula_codec::Value;

/// The filter and sort a UI has selected for one collection.
///
/// The view holds no rows; [`CollectionView::apply`] derives them from
/// the store each time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionView {
    filter: FilterSpec,
    sort: SortSpec,
}

impl CollectionView {
    /// Creates a view whose search covers the schema's searchable fields.
    pub fn for_schema(schema: &Schema) -> Self {
        Self {
            filter: FilterSpec {
                search_fields: schema.searchable_fields(),
                ..FilterSpec::default()
            },
            sort: SortSpec::none(),
        }
    }

    /// Returns the current filter.
    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Returns the current sort.
    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Column header click.
    pub fn request_sort(&mut self, field: &str) {
        self.sort.request(field);
    }

    /// Search box change.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
    }

    /// Replaces the fields searched.
    pub fn set_search_fields(&mut self, fields: Vec<String>) {
        self.filter.search_fields = fields;
    }

    /// Filter dropdown change. A blank value clears the constraint.
    pub fn set_exact_filter(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if value.is_blank() {
            self.filter.exact_filters.remove(&field);
        } else {
            self.filter.exact_filters.insert(field, value);
        }
    }

    /// Sets or, with both bounds `None`, clears a range constraint.
    pub fn set_range_filter(
        &mut self,
        field: impl Into<String>,
        min: Option<Value>,
        max: Option<Value>,
    ) {
        let field = field.into();
        let range = RangeFilter::new(min, max);
        if range.is_unbounded() {
            self.filter.range_filters.remove(&field);
        } else {
            self.filter.range_filters.insert(field, range);
        }
    }

    /// Drops the search term and every exact and range constraint. The
    /// sort and search fields are kept.
    pub fn clear_filters(&mut self) {
        self.filter.search_term.clear();
        self.filter.exact_filters.clear();
        self.filter.range_filters.clear();
    }

    /// Derives the visible rows from `entities`.
    pub fn apply<'a>(&self, entities: &'a [Entity]) -> Vec<&'a Entity> {
        execute(entities, &self.filter, &self.sort)
    }
}
