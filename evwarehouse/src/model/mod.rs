//! Star-schema construction.
//!
//! Four dimensions are deduplicated from the cleaned records, each keyed on
//! its own natural-key columns. The fact table then joins every record
//! against each dimension independently, so a record contributes exactly one
//! fact row whatever the other dimensions look like.

mod dimensions;
mod fact;
mod geo;

pub use dimensions::{
    Dimension, DimensionTable, LocationKey, LocationRow, TimeKey, TimeRow, UtilityRow, VehicleKey,
    VehicleRow,
};
pub use fact::{FactRow, FactTable, UnmatchedKeys, FACT_TABLE};
pub use geo::{parse_point, Coordinates};

use crate::errors::ModelError;
use crate::transform::CleanedTable;

/// The four dimension tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dimensions {
    /// `dim_location`.
    pub location: DimensionTable<LocationRow>,
    /// `dim_vehicle`.
    pub vehicle: DimensionTable<VehicleRow>,
    /// `dim_utility`.
    pub utility: DimensionTable<UtilityRow>,
    /// `dim_time`.
    pub time: DimensionTable<TimeRow>,
}

impl Dimensions {
    /// Builds every dimension from the cleaned records.
    #[must_use]
    pub fn build(cleaned: &CleanedTable) -> Self {
        Self {
            location: DimensionTable::build(&cleaned.records),
            vehicle: DimensionTable::build(&cleaned.records),
            utility: DimensionTable::build(&cleaned.records),
            time: DimensionTable::build(&cleaned.records),
        }
    }

    /// `(table name, row count)` for each dimension, in load order.
    #[must_use]
    pub fn counts(&self) -> [(&'static str, usize); 4] {
        [
            (LocationRow::TABLE, self.location.len()),
            (VehicleRow::TABLE, self.vehicle.len()),
            (UtilityRow::TABLE, self.utility.len()),
            (TimeRow::TABLE, self.time.len()),
        ]
    }
}

/// Dimensions plus fact table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DimensionalModel {
    /// Dimension tables.
    pub dimensions: Dimensions,
    /// Fact table.
    pub fact: FactTable,
}

/// Builds the star schema from the cleaned dataset.
pub fn build_model(cleaned: &CleanedTable) -> Result<DimensionalModel, ModelError> {
    tracing::info!(rows = cleaned.len(), "Creating dimensional model");

    let dimensions = Dimensions::build(cleaned);
    let fact = FactTable::build(&cleaned.records, &dimensions)?;

    if fact.len() != cleaned.len() {
        return Err(ModelError::CardinalityMismatch {
            fact_rows: fact.len(),
            cleaned_rows: cleaned.len(),
        });
    }

    tracing::info!("Dimensional model created successfully");
    Ok(DimensionalModel { dimensions, fact })
}
