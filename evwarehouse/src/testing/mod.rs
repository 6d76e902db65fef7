//! Fixtures and assertions for exercising the warehouse build.
//!
//! This module provides:
//! - The three-row sample dataset as records and as CSV text
//! - Builders for cleaned records and deliberately broken dimensions
//! - Assertions for the star-schema invariants

mod assertions;
mod fixtures;

pub use assertions::{
    assert_fact_cardinality, assert_foreign_keys_resolve, assert_unique_natural_keys,
};
pub use fixtures::{
    cleaned_record, duplicate_utility_dimensions, sample_raw_table, write_sample_csv, SAMPLE_CSV,
};
