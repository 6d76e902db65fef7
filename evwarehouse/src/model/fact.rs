//! `fact_vehicle_registration`: one row per cleaned record.

use super::Dimensions;
use crate::errors::ModelError;
use crate::transform::CleanedRecord;
use serde::{Deserialize, Serialize};

/// Fact table name in the store.
pub const FACT_TABLE: &str = "fact_vehicle_registration";

/// A registration event with foreign keys into each dimension.
///
/// A foreign key is `None` only when the record's natural key has no
/// dimension row, which [`Dimensions::build`] never produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    /// Surrogate key, 1..N in record order.
    pub registration_id: i64,
    /// Key into `dim_location`.
    pub location_id: Option<i64>,
    /// Key into `dim_vehicle`.
    pub vehicle_id: Option<i64>,
    /// Key into `dim_utility`.
    pub utility_id: Option<i64>,
    /// Key into `dim_time`.
    pub time_id: Option<i64>,
    /// Base MSRP; 0 when pricing is unknown.
    pub base_msrp: f64,
    /// Electric range in miles.
    pub electric_range: Option<f64>,
    /// DOL vehicle id from the source.
    pub external_vehicle_id: Option<i64>,
    /// Truncated VIN digest.
    pub vin_hash: String,
}

/// Fact rows whose natural key found no dimension row, per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedKeys {
    /// Rows with no `dim_location` match.
    pub location: usize,
    /// Rows with no `dim_vehicle` match.
    pub vehicle: usize,
    /// Rows with no `dim_utility` match.
    pub utility: usize,
    /// Rows with no `dim_time` match.
    pub time: usize,
}

impl UnmatchedKeys {
    /// Sum across dimensions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.location + self.vehicle + self.utility + self.time
    }
}

/// The built fact table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactTable {
    /// Rows in cleaned-record order; `registration_id` runs 1..N.
    pub rows: Vec<FactRow>,
    /// Unmatched foreign keys.
    pub unmatched: UnmatchedKeys,
}

impl FactTable {
    /// Joins every record against each dimension independently and
    /// assembles the fact rows.
    ///
    /// Fails if any dimension carries a duplicate natural key.
    pub fn build(records: &[CleanedRecord], dimensions: &Dimensions) -> Result<Self, ModelError> {
        let location = dimensions.location.left_join(records)?;
        let vehicle = dimensions.vehicle.left_join(records)?;
        let utility = dimensions.utility.left_join(records)?;
        let time = dimensions.time.left_join(records)?;

        let unmatched = UnmatchedKeys {
            location: count_unmatched(&location),
            vehicle: count_unmatched(&vehicle),
            utility: count_unmatched(&utility),
            time: count_unmatched(&time),
        };

        let rows: Vec<FactRow> = records
            .iter()
            .enumerate()
            .map(|(i, record)| FactRow {
                registration_id: i64::try_from(i).unwrap_or(i64::MAX) + 1,
                location_id: location[i],
                vehicle_id: vehicle[i],
                utility_id: utility[i],
                time_id: time[i],
                base_msrp: record.base_msrp,
                electric_range: record.electric_range,
                external_vehicle_id: record.dol_vehicle_id,
                vin_hash: record.vin_hash.clone(),
            })
            .collect();

        if unmatched.total() > 0 {
            tracing::warn!(
                location = unmatched.location,
                vehicle = unmatched.vehicle,
                utility = unmatched.utility,
                time = unmatched.time,
                "Fact rows with unmatched dimension keys"
            );
        }
        tracing::info!(table = FACT_TABLE, rows = rows.len(), "Created fact table");

        Ok(Self { rows, unmatched })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn count_unmatched(keys: &[Option<i64>]) -> usize {
    keys.iter().filter(|k| k.is_none()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DimensionTable, LocationRow, TimeRow, UtilityRow, VehicleRow};
    use crate::testing::{cleaned_record, duplicate_utility_dimensions};
    use pretty_assertions::assert_eq;

    fn dimensions_for(records: &[CleanedRecord]) -> Dimensions {
        Dimensions {
            location: DimensionTable::<LocationRow>::build(records),
            vehicle: DimensionTable::<VehicleRow>::build(records),
            utility: DimensionTable::<UtilityRow>::build(records),
            time: DimensionTable::<TimeRow>::build(records),
        }
    }

    #[test]
    fn test_one_fact_per_record() {
        let records = vec![
            cleaned_record("TESLA", "MODEL 3", 2020),
            cleaned_record("TESLA", "MODEL 3", 2020),
            cleaned_record("NISSAN", "LEAF", 2013),
        ];
        let dims = dimensions_for(&records);

        let fact = FactTable::build(&records, &dims).unwrap();
        assert_eq!(fact.len(), 3);
        let ids: Vec<i64> = fact.rows.iter().map(|r| r.registration_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(fact.unmatched, UnmatchedKeys::default());
        assert!(fact.rows.iter().all(|r| r.location_id.is_some()
            && r.vehicle_id.is_some()
            && r.utility_id.is_some()
            && r.time_id.is_some()));
        assert_eq!(fact.rows[0].vehicle_id, fact.rows[1].vehicle_id);
        assert_eq!(fact.rows[2].vehicle_id, Some(2));
    }

    #[test]
    fn test_measures_carried_from_record() {
        let mut record = cleaned_record("KIA", "EV6", 2023);
        record.base_msrp = 0.0;
        record.electric_range = Some(310.0);
        record.dol_vehicle_id = Some(123_456);
        record.vin_hash = "2a060519b9".to_string();
        let records = vec![record];

        let fact = FactTable::build(&records, &dimensions_for(&records)).unwrap();
        let row = &fact.rows[0];
        assert_eq!(row.base_msrp, 0.0);
        assert_eq!(row.electric_range, Some(310.0));
        assert_eq!(row.external_vehicle_id, Some(123_456));
        assert_eq!(row.vin_hash, "2a060519b9");
    }

    #[test]
    fn test_unmatched_keys_counted_not_dropped() {
        let known = cleaned_record("TESLA", "MODEL 3", 2020);
        let dims = dimensions_for(std::slice::from_ref(&known));

        let mut stranger = known.clone();
        stranger.electric_utility = "BONNEVILLE POWER ADMINISTRATION".to_string();
        stranger.model_year = Some(2024);
        stranger.model_decade = Some(2020);

        let fact = FactTable::build(&[known, stranger], &dims).unwrap();
        assert_eq!(fact.len(), 2);
        assert_eq!(fact.rows[1].utility_id, None);
        assert_eq!(fact.rows[1].time_id, None);
        assert_eq!(fact.rows[1].vehicle_id, Some(1));
        assert_eq!(fact.unmatched.utility, 1);
        assert_eq!(fact.unmatched.time, 1);
        assert_eq!(fact.unmatched.total(), 2);
    }

    #[test]
    fn test_duplicate_dimension_key_is_rejected() {
        let records = vec![cleaned_record("TESLA", "MODEL 3", 2020)];
        let dims = duplicate_utility_dimensions(&records);

        let err = FactTable::build(&records, &dims).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DuplicateNaturalKey { ref dimension, .. } if dimension == "dim_utility"
        ));
    }
}
