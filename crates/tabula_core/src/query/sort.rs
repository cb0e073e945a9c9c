//! Sort state and the stable comparator.

use crate::entity::Entity;
use std::cmp::Ordering;
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to sort by (a dotted path is allowed).
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Creates a sort key.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Ordered sort keys. Only the first key is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// No sorting: stored order.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Sorts by one field.
    #[must_use]
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            keys: vec![SortKey::new(field, direction)],
        }
    }

    /// Returns the active key.
    pub fn primary(&self) -> Option<&SortKey> {
        self.keys.first()
    }

    /// Returns all keys.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Handles a sort request for `field`: the active field toggles its
    /// direction, any other field becomes active ascending.
    pub fn request(&mut self, field: &str) {
        match self.keys.first_mut() {
            Some(key) if key.field == field => key.direction = key.direction.toggled(),
            _ => self.keys = vec![SortKey::new(field, SortDirection::Asc)],
        }
    }
}

/// Orders entities by `key`, stably.
///
/// Missing values sort last in either direction. Ties keep their input
/// order.
pub fn sort_entities(entities: &mut Vec<&Entity>, key: &SortKey) {
    let mut decorated: Vec<(usize, &Entity)> = entities.drain(..).enumerate().collect();
    decorated.sort_by(|(ia, a), (ib, b)| {
        compare_by(a, b, key).then_with(|| ia.cmp(ib))
    });
    entities.extend(decorated.into_iter().map(|(_, e)| e));
}

fn compare_by(a: &Entity, b: &Entity, key: &SortKey) -> Ordering {
    let va = a.resolve_path(&key.field);
    let vb = b.resolve_path(&key.field);
    match (va.is_null(), vb.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = va.sort_cmp(&vb);
            match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}
