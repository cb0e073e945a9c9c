//! Collection summaries.
//!
//! Dashboard-style aggregates: how many entities hold each enum value and
//! the total of each number field.

use crate::entity::Entity;
use crate::schema::Schema;
use std::collections::BTreeMap;
use tabula_codec::{FieldType, Value};

/// Aggregates over one collection (or one filtered view of it).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionStats {
    /// Number of entities.
    pub total: usize,
    /// Per enum field, the count of entities holding each declared value.
    /// Values no entity holds are listed with a zero count.
    pub enum_counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// Per number field, the sum over entities (nulls count as zero).
    pub numeric_sums: BTreeMap<String, f64>,
}

impl CollectionStats {
    /// Computes the aggregates for `entities` under `schema`.
    pub fn compute<'a, I>(schema: &Schema, entities: I) -> Self
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let mut stats = Self::default();
        for field in &schema.fields {
            match &field.field_type {
                FieldType::Enum { values } => {
                    let counts = values.iter().map(|v| (v.clone(), 0)).collect();
                    stats.enum_counts.insert(field.name.clone(), counts);
                }
                FieldType::Number => {
                    stats.numeric_sums.insert(field.name.clone(), 0.0);
                }
                _ => {}
            }
        }

        for entity in entities {
            stats.total += 1;
            for (field, counts) in &mut stats.enum_counts {
                if let Some(Value::Text(v)) = entity.get(field) {
                    if let Some(count) = counts.get_mut(v) {
                        *count += 1;
                    }
                }
            }
            for (field, sum) in &mut stats.numeric_sums {
                *sum += entity.value(field).as_number().unwrap_or(0.0);
            }
        }
        stats
    }

    /// Returns the count of `value` in enum field `field`.
    pub fn count_of(&self, field: &str, value: &str) -> usize {
        self.enum_counts
            .get(field)
            .and_then(|counts| counts.get(value))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::EntityStore;
    use crate::entity::EntityDraft;
    use crate::schema::FieldDef;

    #[test]
    fn counts_and_sums() {
        let schema = Schema::builder("investments")
            .field(FieldDef::new("kind", FieldType::enumeration(["stock", "bond", "fund"])))
            .field(FieldDef::new("amount", FieldType::Number))
            .field(FieldDef::new("note", FieldType::Text))
            .build()
            .unwrap();
        let mut store = EntityStore::new(schema.clone());
        store.create(EntityDraft::new().set("kind", "stock").set("amount", 100)).unwrap();
        store.create(EntityDraft::new().set("kind", "stock").set("amount", 50.5)).unwrap();
        store.create(EntityDraft::new().set("kind", "bond")).unwrap();

        let stats = CollectionStats::compute(&schema, store.list());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count_of("kind", "stock"), 2);
        assert_eq!(stats.count_of("kind", "bond"), 1);
        assert_eq!(stats.count_of("kind", "fund"), 0);
        assert_eq!(stats.enum_counts["kind"].len(), 3);
        assert!((stats.numeric_sums["amount"] - 150.5).abs() < 1e-9);
        assert!(!stats.numeric_sums.contains_key("note"));
    }
}
