//! Query engine: filtering and sorting a collection into a derived view.
//!
//! Views are recomputed from the store on every read; nothing is cached
//! across mutations.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tabula_core::query::{execute, FilterSpec, SortDirection, SortSpec};
//!
//! let filter = FilterSpec::new().exact("status", "pending");
//! let sort = SortSpec::by("amount", SortDirection::Desc);
//! let rows = execute(store.list(), &filter, &sort);
//! ```

mod filter;
mod sort;

pub use filter::{FilterSpec, RangeFilter};
pub use sort::{sort_entities, SortDirection, SortKey, SortSpec};

use crate::entity::Entity;

/// Filters then sorts `entities`, returning borrowed rows.
pub fn execute<'a>(entities: &'a [Entity], filter: &FilterSpec, sort: &SortSpec) -> Vec<&'a Entity> {
    let mut rows: Vec<&Entity> = entities.iter().filter(|e| filter.matches(e)).collect();
    if let Some(key) = sort.primary() {
        sort_entities(&mut rows, key);
    }
    rows
}
