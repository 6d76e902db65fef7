//! Dimension rows and the generic dedupe-and-key builder.

use super::geo::parse_point;
use crate::errors::ModelError;
use crate::transform::{CleanedRecord, YearCategory};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// A dimension of the star schema.
///
/// `natural_key` projects a cleaned record onto the dimension's natural-key
/// columns; `key` does the same for an already-built row. The two must agree
/// for a record and the row built from it.
pub trait Dimension: Sized {
    /// Natural-key column values.
    type Key: Eq + Hash + Clone;

    /// Table name in the store.
    const TABLE: &'static str;

    /// Projects a cleaned record onto the natural key.
    fn natural_key(record: &CleanedRecord) -> Self::Key;

    /// Builds a row from the first record carrying a natural key.
    fn from_record(surrogate_key: i64, record: &CleanedRecord) -> Self;

    /// Natural key of this row.
    fn key(&self) -> Self::Key;

    /// Surrogate key of this row.
    fn surrogate_key(&self) -> i64;
}

/// A built dimension table. Rows are ordered by surrogate key, starting at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionTable<D> {
    rows: Vec<D>,
}

impl<D> Default for DimensionTable<D> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<D: Dimension> DimensionTable<D> {
    /// Deduplicates `records` on the natural key, keeping first occurrences,
    /// and assigns surrogate keys 1..N in that order.
    #[must_use]
    pub fn build(records: &[CleanedRecord]) -> Self {
        let mut seen: HashMap<D::Key, i64> = HashMap::new();
        let mut rows = Vec::new();

        for record in records {
            if let Entry::Vacant(slot) = seen.entry(D::natural_key(record)) {
                let id = i64::try_from(rows.len()).unwrap_or(i64::MAX) + 1;
                slot.insert(id);
                rows.push(D::from_record(id, record));
            }
        }

        tracing::info!(table = D::TABLE, rows = rows.len(), "Created dimension");
        Self { rows }
    }

    /// Wraps rows that were built elsewhere (e.g. read back from a store).
    #[must_use]
    pub fn from_rows(rows: Vec<D>) -> Self {
        Self { rows }
    }

    /// Builds the natural key -> surrogate key lookup.
    ///
    /// Fails if two rows share a natural key, since a join against such a
    /// table could match a record twice.
    pub fn index(&self) -> Result<HashMap<D::Key, i64>, ModelError> {
        let mut index = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            if index.insert(row.key(), row.surrogate_key()).is_some() {
                return Err(ModelError::DuplicateNaturalKey {
                    dimension: D::TABLE.to_string(),
                    surrogate_key: row.surrogate_key(),
                });
            }
        }
        Ok(index)
    }

    /// Left-joins `records` against this table on the natural key.
    ///
    /// Returns one entry per record, `None` where no row matched.
    pub fn left_join(&self, records: &[CleanedRecord]) -> Result<Vec<Option<i64>>, ModelError> {
        let index = self.index()?;
        Ok(records
            .iter()
            .map(|r| index.get(&D::natural_key(r)).copied())
            .collect())
    }

    /// Rows in surrogate-key order.
    #[must_use]
    pub fn rows(&self) -> &[D] {
        &self.rows
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

/// Location natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey {
    /// County.
    pub county: String,
    /// City.
    pub city: String,
    /// State.
    pub state: Option<String>,
    /// Postal code.
    pub postal_code: String,
    /// Legislative district.
    pub legislative_district: String,
    /// Census tract.
    pub census_tract: String,
}

/// `dim_location` row.
///
/// Coordinates come from the first record seen for the location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Surrogate key.
    pub location_id: i64,
    /// County, or `"Unknown"`.
    pub county: String,
    /// City, or `"Unknown"`.
    pub city: String,
    /// State as delivered.
    pub state: Option<String>,
    /// Postal code, or `"Unknown"`.
    pub postal_code: String,
    /// Legislative district, or `"Unknown"`.
    pub legislative_district: String,
    /// Census tract, or `"Unknown"`.
    pub census_tract: String,
    /// Latitude of the first occurrence, if its point parsed.
    pub latitude: Option<f64>,
    /// Longitude of the first occurrence, if its point parsed.
    pub longitude: Option<f64>,
}

impl Dimension for LocationRow {
    type Key = LocationKey;
    const TABLE: &'static str = "dim_location";

    fn natural_key(record: &CleanedRecord) -> LocationKey {
        LocationKey {
            county: record.county.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            postal_code: record.postal_code.clone(),
            legislative_district: record.legislative_district.clone(),
            census_tract: record.census_tract.clone(),
        }
    }

    fn from_record(surrogate_key: i64, record: &CleanedRecord) -> Self {
        let coordinates = parse_point(record.vehicle_location.as_deref());
        Self {
            location_id: surrogate_key,
            county: record.county.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            postal_code: record.postal_code.clone(),
            legislative_district: record.legislative_district.clone(),
            census_tract: record.census_tract.clone(),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
        }
    }

    fn key(&self) -> LocationKey {
        LocationKey {
            county: self.county.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            legislative_district: self.legislative_district.clone(),
            census_tract: self.census_tract.clone(),
        }
    }

    fn surrogate_key(&self) -> i64 {
        self.location_id
    }
}

/// Vehicle natural key: make, model, type, eligibility and both codes.
pub type VehicleKey = (String, String, String, String, u8, u8);

/// `dim_vehicle` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRow {
    /// Surrogate key.
    pub vehicle_id: i64,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Vehicle type classification.
    pub vehicle_type: String,
    /// CAFV eligibility classification.
    pub eligibility_category: String,
    /// Encoded vehicle type.
    pub ev_type_code: u8,
    /// Encoded CAFV eligibility.
    pub cafv_code: u8,
}

impl Dimension for VehicleRow {
    type Key = VehicleKey;
    const TABLE: &'static str = "dim_vehicle";

    fn natural_key(record: &CleanedRecord) -> VehicleKey {
        (
            record.make.clone(),
            record.model.clone(),
            record.ev_type.clone(),
            record.cafv_eligibility.clone(),
            record.ev_type_code,
            record.cafv_code,
        )
    }

    fn from_record(surrogate_key: i64, record: &CleanedRecord) -> Self {
        Self {
            vehicle_id: surrogate_key,
            make: record.make.clone(),
            model: record.model.clone(),
            vehicle_type: record.ev_type.clone(),
            eligibility_category: record.cafv_eligibility.clone(),
            ev_type_code: record.ev_type_code,
            cafv_code: record.cafv_code,
        }
    }

    fn key(&self) -> VehicleKey {
        (
            self.make.clone(),
            self.model.clone(),
            self.vehicle_type.clone(),
            self.eligibility_category.clone(),
            self.ev_type_code,
            self.cafv_code,
        )
    }

    fn surrogate_key(&self) -> i64 {
        self.vehicle_id
    }
}

/// `dim_utility` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityRow {
    /// Surrogate key.
    pub utility_id: i64,
    /// Utility name, or `"Unknown"`.
    pub utility_name: String,
}

impl Dimension for UtilityRow {
    type Key = String;
    const TABLE: &'static str = "dim_utility";

    fn natural_key(record: &CleanedRecord) -> String {
        record.electric_utility.clone()
    }

    fn from_record(surrogate_key: i64, record: &CleanedRecord) -> Self {
        Self {
            utility_id: surrogate_key,
            utility_name: record.electric_utility.clone(),
        }
    }

    fn key(&self) -> String {
        self.utility_name.clone()
    }

    fn surrogate_key(&self) -> i64 {
        self.utility_id
    }
}

/// Time natural key: model year, decade, year category.
pub type TimeKey = (Option<i32>, Option<i32>, Option<YearCategory>);

/// `dim_time` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRow {
    /// Surrogate key.
    pub time_id: i64,
    /// Model year.
    pub model_year: Option<i32>,
    /// Decade of the model year.
    pub model_decade: Option<i32>,
    /// Model-year bucket.
    pub year_category: Option<YearCategory>,
}

impl Dimension for TimeRow {
    type Key = TimeKey;
    const TABLE: &'static str = "dim_time";

    fn natural_key(record: &CleanedRecord) -> TimeKey {
        (record.model_year, record.model_decade, record.year_category)
    }

    fn from_record(surrogate_key: i64, record: &CleanedRecord) -> Self {
        Self {
            time_id: surrogate_key,
            model_year: record.model_year,
            model_decade: record.model_decade,
            year_category: record.year_category,
        }
    }

    fn key(&self) -> TimeKey {
        (self.model_year, self.model_decade, self.year_category)
    }

    fn surrogate_key(&self) -> i64 {
        self.time_id
    }
}
