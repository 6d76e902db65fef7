//! Assertions for star-schema invariants.

use std::collections::HashSet;

use crate::model::{Dimension, DimensionTable, DimensionalModel};
use crate::transform::CleanedTable;

/// Asserts one fact row per cleaned record.
pub fn assert_fact_cardinality(model: &DimensionalModel, cleaned: &CleanedTable) {
    assert_eq!(
        model.fact.len(),
        cleaned.len(),
        "Expected {} fact rows, got {}",
        cleaned.len(),
        model.fact.len()
    );
}

/// Asserts that no two rows of a dimension share a natural key.
pub fn assert_unique_natural_keys<D: Dimension>(table: &DimensionTable<D>) {
    let keys: HashSet<D::Key> = table.rows().iter().map(Dimension::key).collect();
    assert_eq!(
        keys.len(),
        table.len(),
        "Dimension '{}' has {} rows but only {} distinct natural keys",
        D::TABLE,
        table.len(),
        keys.len()
    );
}

/// Asserts that every fact foreign key is set.
pub fn assert_foreign_keys_resolve(model: &DimensionalModel) {
    assert_eq!(
        model.fact.unmatched.total(),
        0,
        "Unmatched foreign keys: {:?}",
        model.fact.unmatched
    );
}
