//! Cleaning and enrichment of raw records.
//!
//! Missing values are imputed per field category, the two classification
//! strings get integer codes, and decade, year category and VIN hash are
//! derived. The raw table is left untouched.

mod derived;
mod encoding;

pub use derived::{model_decade, vin_hash, YearCategory, VIN_HASH_LEN};
pub use encoding::{encode_cafv, encode_ev_type, CAFV_CODES, EV_TYPE_CODES};

use crate::config::HashAlgorithm;
use crate::explore::median;
use crate::extract::{
    RawRecord, RawTable, COL_BASE_MSRP, COL_CAFV, COL_CENSUS_TRACT, COL_CITY, COL_COUNTY,
    COL_ELECTRIC_RANGE, COL_ELECTRIC_UTILITY, COL_EV_TYPE, COL_LEGISLATIVE_DISTRICT, COL_MAKE,
    COL_MODEL, COL_POSTAL_CODE,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Placeholder for missing categorical and geographic values.
pub const UNKNOWN: &str = "Unknown";

/// A registration row after imputation and enrichment.
///
/// `base_msrp == 0.0` means "unknown pricing" and is indistinguishable from a
/// genuine zero price. `vin_hash == "Unknown"` means the VIN was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    /// Original VIN prefix, kept for lineage.
    pub vin: Option<String>,
    /// County, or `"Unknown"`.
    pub county: String,
    /// City, or `"Unknown"`.
    pub city: String,
    /// State as delivered.
    pub state: Option<String>,
    /// Postal code, or `"Unknown"`.
    pub postal_code: String,
    /// Model year as delivered.
    pub model_year: Option<i32>,
    /// Make, or `"Unknown"`.
    pub make: String,
    /// Model, or `"Unknown"`.
    pub model: String,
    /// Vehicle type classification, or `"Unknown"`.
    pub ev_type: String,
    /// CAFV eligibility classification, or `"Unknown"`.
    pub cafv_eligibility: String,
    /// Electric range; missing values take the column median.
    pub electric_range: Option<f64>,
    /// Base MSRP; missing values become 0.
    pub base_msrp: f64,
    /// Legislative district, or `"Unknown"`.
    pub legislative_district: String,
    /// External vehicle id.
    pub dol_vehicle_id: Option<i64>,
    /// Raw geocoordinate string.
    pub vehicle_location: Option<String>,
    /// Electric utility, or `"Unknown"`.
    pub electric_utility: String,
    /// Census tract, or `"Unknown"`.
    pub census_tract: String,
    /// Vehicle type code in {0, 1, 2}.
    pub ev_type_code: u8,
    /// CAFV eligibility code in {0, 1, 2, 3}.
    pub cafv_code: u8,
    /// `floor(model_year / 10) * 10`.
    pub model_decade: Option<i32>,
    /// Model-year bucket.
    pub year_category: Option<YearCategory>,
    /// Truncated VIN digest, or `"Unknown"`.
    pub vin_hash: String,
}

/// How many values of one column were imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    /// Source column name.
    pub column: String,
    /// Number of imputed cells.
    pub filled: usize,
    /// Value used for imputation.
    pub value: String,
}

/// The cleaned dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanedTable {
    /// Cleaned rows, one per raw row, in source order.
    pub records: Vec<CleanedRecord>,
    /// Imputation applied, per column.
    pub fills: Vec<FillRecord>,
}

impl CleanedTable {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the fill record for a column, if any values were imputed.
    #[must_use]
    pub fn fill(&self, column: &str) -> Option<&FillRecord> {
        self.fills.iter().find(|f| f.column == column)
    }
}

/// Knobs for the transform stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Upper year bound for the `2021+` bucket is `current_year + 1`.
    pub current_year: i32,
    /// Digest for `vin_hash`.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            current_year: chrono::Utc::now().year(),
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

impl TransformOptions {
    /// Sets the hash algorithm.
    #[must_use]
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Pins the current year.
    #[must_use]
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }
}

const UNKNOWN_FILLED: [&str; 10] = [
    COL_COUNTY,
    COL_CITY,
    COL_MAKE,
    COL_MODEL,
    COL_EV_TYPE,
    COL_CAFV,
    COL_ELECTRIC_UTILITY,
    COL_POSTAL_CODE,
    COL_LEGISLATIVE_DISTRICT,
    COL_CENSUS_TRACT,
];

/// Cleans and enriches every raw record.
#[must_use]
pub fn clean(raw: &RawTable, options: TransformOptions) -> CleanedTable {
    tracing::info!(rows = raw.len(), "Cleaning and transforming data");

    let mut fills = Vec::new();

    for column in UNKNOWN_FILLED {
        let filled = raw.records.iter().filter(|r| r.is_missing(column)).count();
        if filled > 0 {
            tracing::info!(column, filled, "Filled missing values with 'Unknown'");
            fills.push(FillRecord {
                column: column.to_string(),
                filled,
                value: UNKNOWN.to_string(),
            });
        }
    }

    let ranges: Vec<f64> = raw
        .records
        .iter()
        .filter_map(|r| finite(r.electric_range))
        .collect();
    let range_median = median(&ranges);
    let missing_ranges = raw.len() - ranges.len();
    match range_median {
        Some(m) => {
            tracing::info!(
                column = COL_ELECTRIC_RANGE,
                filled = missing_ranges,
                median = m,
                "Filled missing values with median"
            );
            if missing_ranges > 0 {
                fills.push(FillRecord {
                    column: COL_ELECTRIC_RANGE.to_string(),
                    filled: missing_ranges,
                    value: m.to_string(),
                });
            }
        }
        None if missing_ranges > 0 => tracing::warn!(
            column = COL_ELECTRIC_RANGE,
            missing = missing_ranges,
            "No electric range values to take a median from; leaving them missing"
        ),
        None => {}
    }

    let missing_msrp = raw
        .records
        .iter()
        .filter(|r| r.is_missing(COL_BASE_MSRP))
        .count();
    tracing::info!(
        column = COL_BASE_MSRP,
        filled = missing_msrp,
        "Filled missing values with 0 (unknown pricing)"
    );
    if missing_msrp > 0 {
        fills.push(FillRecord {
            column: COL_BASE_MSRP.to_string(),
            filled: missing_msrp,
            value: "0".to_string(),
        });
    }

    let records: Vec<CleanedRecord> = raw
        .records
        .iter()
        .map(|r| clean_record(r, range_median, options))
        .collect();

    tracing::info!(
        rows = records.len(),
        "Encoded ev_type_code (BEV=1, PHEV=2, other=0) and \
         cafv_code (eligible=1, low range=2, not researched=3, other=0)"
    );
    tracing::info!(rows = records.len(), "Data cleaning completed");

    CleanedTable { records, fills }
}

fn or_unknown(value: Option<&String>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), Clone::clone)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn clean_record(
    raw: &RawRecord,
    range_median: Option<f64>,
    options: TransformOptions,
) -> CleanedRecord {
    let ev_type = or_unknown(raw.ev_type.as_ref());
    let cafv_eligibility = or_unknown(raw.cafv_eligibility.as_ref());

    CleanedRecord {
        vin: raw.vin.clone(),
        county: or_unknown(raw.county.as_ref()),
        city: or_unknown(raw.city.as_ref()),
        state: raw.state.clone(),
        postal_code: or_unknown(raw.postal_code.as_ref()),
        model_year: raw.model_year,
        make: or_unknown(raw.make.as_ref()),
        model: or_unknown(raw.model.as_ref()),
        ev_type_code: encode_ev_type(&ev_type),
        cafv_code: encode_cafv(&cafv_eligibility),
        ev_type,
        cafv_eligibility,
        electric_range: finite(raw.electric_range).or(range_median),
        base_msrp: finite(raw.base_msrp).unwrap_or(0.0),
        legislative_district: or_unknown(raw.legislative_district.as_ref()),
        dol_vehicle_id: raw.dol_vehicle_id,
        vehicle_location: raw.vehicle_location.clone(),
        electric_utility: or_unknown(raw.electric_utility.as_ref()),
        census_tract: or_unknown(raw.census_tract.as_ref()),
        model_decade: raw.model_year.map(model_decade),
        year_category: raw
            .model_year
            .and_then(|y| YearCategory::from_year(y, options.current_year)),
        vin_hash: vin_hash(raw.vin.as_deref(), options.hash_algorithm),
    }
}
