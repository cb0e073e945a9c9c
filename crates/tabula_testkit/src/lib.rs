//! # Tabula Testkit
//!
//! Test utilities for Tabula.
//!
//! This crate provides:
//! - Test fixtures with a manual clock and inspectable storage
//! - Sample schemas for a small fleet domain
//! - Property-based test generators using proptest
//! - Helpers for comparing collections by value
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tabula_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_workspace() {
//!     let mut fixture = TestWorkspace::fleet();
//!     fixture.create("vehicles", vehicle("v1", "AB-1")).unwrap();
//!     assert_eq!(fixture.settle(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod schemas;

use tabula_core::{Entity, Fields};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::schemas::*;
    pub use crate::{field_values, same_multiset};
}

pub use fixtures::*;
pub use generators::*;
pub use schemas::*;

/// The non-id field values of each entity, in order.
pub fn field_values<'a, I>(entities: I) -> Vec<Fields>
where
    I: IntoIterator<Item = &'a Entity>,
{
    entities.into_iter().map(|e| e.fields().clone()).collect()
}

/// Returns true if both slices hold the same elements with the same
/// multiplicities, in any order.
pub fn same_multiset<T: PartialEq>(left: &[T], right: &[T]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    left.iter().all(|item| {
        let found = (0..right.len()).find(|&i| !used[i] && right[i] == *item);
        if let Some(i) = found {
            used[i] = true;
        }
        found.is_some()
    })
}
