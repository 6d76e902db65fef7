//! Raw source rows as delivered by the dataset.

use crate::errors::ExtractionError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Source header for the truncated VIN.
pub const COL_VIN: &str = "VIN (1-10)";
/// Source header for the county.
pub const COL_COUNTY: &str = "County";
/// Source header for the city.
pub const COL_CITY: &str = "City";
/// Source header for the state.
pub const COL_STATE: &str = "State";
/// Source header for the postal code.
pub const COL_POSTAL_CODE: &str = "Postal Code";
/// Source header for the model year.
pub const COL_MODEL_YEAR: &str = "Model Year";
/// Source header for the make.
pub const COL_MAKE: &str = "Make";
/// Source header for the model.
pub const COL_MODEL: &str = "Model";
/// Source header for the vehicle type classification.
pub const COL_EV_TYPE: &str = "Electric Vehicle Type";
/// Source header for the CAFV eligibility classification.
pub const COL_CAFV: &str = "Clean Alternative Fuel Vehicle (CAFV) Eligibility";
/// Source header for the electric range.
pub const COL_ELECTRIC_RANGE: &str = "Electric Range";
/// Source header for the base MSRP.
pub const COL_BASE_MSRP: &str = "Base MSRP";
/// Source header for the legislative district.
pub const COL_LEGISLATIVE_DISTRICT: &str = "Legislative District";
/// Source header for the external vehicle id.
pub const COL_DOL_VEHICLE_ID: &str = "DOL Vehicle ID";
/// Source header for the geocoordinate string.
pub const COL_VEHICLE_LOCATION: &str = "Vehicle Location";
/// Source header for the electric utility.
pub const COL_ELECTRIC_UTILITY: &str = "Electric Utility";
/// Source header for the census tract.
pub const COL_CENSUS_TRACT: &str = "2020 Census Tract";

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: [&str; 17] = [
    COL_VIN,
    COL_COUNTY,
    COL_CITY,
    COL_STATE,
    COL_POSTAL_CODE,
    COL_MODEL_YEAR,
    COL_MAKE,
    COL_MODEL,
    COL_EV_TYPE,
    COL_CAFV,
    COL_ELECTRIC_RANGE,
    COL_BASE_MSRP,
    COL_LEGISLATIVE_DISTRICT,
    COL_DOL_VEHICLE_ID,
    COL_VEHICLE_LOCATION,
    COL_ELECTRIC_UTILITY,
    COL_CENSUS_TRACT,
];

/// Cell contents read as missing in addition to empty cells.
pub const NA_TOKENS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "none",
];

/// Returns true if `cell` is one of the [`NA_TOKENS`].
#[must_use]
pub fn is_na_token(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

fn na_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let cell = Option::<String>::deserialize(deserializer)?;
    Ok(cell.filter(|c| !is_na_token(c)))
}

fn na_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match na_text(deserializer)? {
        Some(cell) => cell.parse().map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}

fn na_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(na_number::<D, f64>(deserializer)?.filter(|v| v.is_finite()))
}

/// One vehicle registration row.
///
/// Empty cells and [`NA_TOKENS`] are `None`; so are non-finite numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// First ten characters of the VIN.
    #[serde(rename = "VIN (1-10)", deserialize_with = "na_text")]
    pub vin: Option<String>,
    /// County of registration.
    #[serde(rename = "County", deserialize_with = "na_text")]
    pub county: Option<String>,
    /// City of registration.
    #[serde(rename = "City", deserialize_with = "na_text")]
    pub city: Option<String>,
    /// Two-letter state code.
    #[serde(rename = "State", deserialize_with = "na_text")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(rename = "Postal Code", deserialize_with = "na_text")]
    pub postal_code: Option<String>,
    /// Model year.
    #[serde(rename = "Model Year", deserialize_with = "na_number")]
    pub model_year: Option<i32>,
    /// Manufacturer.
    #[serde(rename = "Make", deserialize_with = "na_text")]
    pub make: Option<String>,
    /// Model name.
    #[serde(rename = "Model", deserialize_with = "na_text")]
    pub model: Option<String>,
    /// Vehicle type classification (BEV/PHEV).
    #[serde(rename = "Electric Vehicle Type", deserialize_with = "na_text")]
    pub ev_type: Option<String>,
    /// CAFV eligibility classification.
    #[serde(
        rename = "Clean Alternative Fuel Vehicle (CAFV) Eligibility",
        deserialize_with = "na_text"
    )]
    pub cafv_eligibility: Option<String>,
    /// All-electric range in miles.
    #[serde(rename = "Electric Range", deserialize_with = "na_float")]
    pub electric_range: Option<f64>,
    /// Manufacturer's suggested retail price.
    #[serde(rename = "Base MSRP", deserialize_with = "na_float")]
    pub base_msrp: Option<f64>,
    /// Legislative district.
    #[serde(rename = "Legislative District", deserialize_with = "na_text")]
    pub legislative_district: Option<String>,
    /// Department of Licensing vehicle id.
    #[serde(rename = "DOL Vehicle ID", deserialize_with = "na_number")]
    pub dol_vehicle_id: Option<i64>,
    /// Geocoordinates as `POINT (<lon> <lat>)`.
    #[serde(rename = "Vehicle Location", deserialize_with = "na_text")]
    pub vehicle_location: Option<String>,
    /// Serving electric utility.
    #[serde(rename = "Electric Utility", deserialize_with = "na_text")]
    pub electric_utility: Option<String>,
    /// 2020 census tract.
    #[serde(rename = "2020 Census Tract", deserialize_with = "na_text")]
    pub census_tract: Option<String>,
}

impl RawRecord {
    /// Returns whether the named source column is empty in this row.
    ///
    /// Unknown column names are reported as present.
    #[must_use]
    pub fn is_missing(&self, column: &str) -> bool {
        match column {
            COL_VIN => self.vin.is_none(),
            COL_COUNTY => self.county.is_none(),
            COL_CITY => self.city.is_none(),
            COL_STATE => self.state.is_none(),
            COL_POSTAL_CODE => self.postal_code.is_none(),
            COL_MODEL_YEAR => self.model_year.is_none(),
            COL_MAKE => self.make.is_none(),
            COL_MODEL => self.model.is_none(),
            COL_EV_TYPE => self.ev_type.is_none(),
            COL_CAFV => self.cafv_eligibility.is_none(),
            COL_ELECTRIC_RANGE => self.electric_range.filter(|v| v.is_finite()).is_none(),
            COL_BASE_MSRP => self.base_msrp.filter(|v| v.is_finite()).is_none(),
            COL_LEGISLATIVE_DISTRICT => self.legislative_district.is_none(),
            COL_DOL_VEHICLE_ID => self.dol_vehicle_id.is_none(),
            COL_VEHICLE_LOCATION => self.vehicle_location.is_none(),
            COL_ELECTRIC_UTILITY => self.electric_utility.is_none(),
            COL_CENSUS_TRACT => self.census_tract.is_none(),
            _ => false,
        }
    }
}

/// The extracted dataset: header row plus records, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Header names as they appeared in the source.
    pub columns: Vec<String>,
    /// Parsed rows.
    pub records: Vec<RawRecord>,
}

impl RawTable {
    /// Creates a table from records, using the standard column set.
    #[must_use]
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self {
            columns: REQUIRED_COLUMNS.iter().map(ToString::to_string).collect(),
            records,
        }
    }

    /// Parses comma-delimited text with a header row.
    ///
    /// Every data row must have the header's field count, and numeric
    /// columns must hold numbers, be empty, or hold one of the [`NA_TOKENS`].
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ExtractionError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(ToString::to_string).collect();

        let present: HashSet<&str> = columns.iter().map(String::as_str).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !present.contains(*c))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ExtractionError::MissingColumns { missing });
        }

        let records = csv_reader
            .deserialize::<RawRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns, records })
    }

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

    /// Number of columns in the header.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Count of empty cells for each known column, in header order.
    #[must_use]
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .filter(|c| REQUIRED_COLUMNS.contains(&c.as_str()))
            .map(|c| {
                let count = self.records.iter().filter(|r| r.is_missing(c)).count();
                (c.clone(), count)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "VIN (1-10),County,City,State,Postal Code,Model Year,Make,Model,\
Electric Vehicle Type,Clean Alternative Fuel Vehicle (CAFV) Eligibility,Electric Range,\
Base MSRP,Legislative District,DOL Vehicle ID,Vehicle Location,Electric Utility,2020 Census Tract";

    #[test]
    fn test_parse_rows_with_empty_cells() {
        let data = format!(
            "{HEADER}\n\
5YJ3E1EA7K,King,Seattle,WA,98101,2019,TESLA,MODEL 3,Battery Electric Vehicle (BEV),\
Clean Alternative Fuel Vehicle Eligible,220,0,43,478934,POINT (-122.33 47.60),CITY OF SEATTLE,53033007300\n\
,,,WA,,2021,NISSAN,LEAF,,,,,,12345,,,\n"
        );

        let table = RawTable::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_count(), 17);

        let first = &table.records[0];
        assert_eq!(first.vin.as_deref(), Some("5YJ3E1EA7K"));
        assert_eq!(first.model_year, Some(2019));
        assert_eq!(first.electric_range, Some(220.0));
        assert_eq!(first.vehicle_location.as_deref(), Some("POINT (-122.33 47.60)"));

        let second = &table.records[1];
        assert_eq!(second.vin, None);
        assert_eq!(second.county, None);
        assert_eq!(second.electric_range, None);
        assert_eq!(second.dol_vehicle_id, Some(12345));
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let data = format!(
            "{HEADER}\n\
ABC,King,Seattle,WA,98101,2020,TESLA,MODEL Y,Battery Electric Vehicle (BEV),\
Clean Alternative Fuel Vehicle Eligible,0,0,43,1,POINT (-122.3 47.6),\
\"PUGET SOUND ENERGY INC||CITY OF TACOMA - (WA)\",53033007300\n"
        );

        let table = RawTable::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(
            table.records[0].electric_utility.as_deref(),
            Some("PUGET SOUND ENERGY INC||CITY OF TACOMA - (WA)")
        );
    }

    #[test]
    fn test_missing_required_columns() {
        let data = "VIN (1-10),County\nABC,King\n";
        let err = RawTable::from_csv_reader(data.as_bytes()).unwrap_err();
        match err {
            ExtractionError::MissingColumns { missing } => {
                assert!(missing.contains(&"Make".to_string()));
                assert!(!missing.contains(&"County".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let data = format!("{HEADER}\nABC,King\n");
        let err = RawTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
    }

    #[test]
    fn test_non_numeric_year_is_parse_error() {
        let data = format!("{HEADER}\nABC,King,Seattle,WA,98101,twenty,TESLA,M3,,,,,,,,,\n");
        let err = RawTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
    }

    #[test]
    fn test_na_tokens_read_as_missing() {
        let data = format!(
            "{HEADER}\n\
N/A,NA,Seattle,WA,98101,N/A,TESLA,MODEL 3,null,\
Clean Alternative Fuel Vehicle Eligible,N/A,NaN,43,NULL,nan,CITY OF SEATTLE,#N/A\n"
        );

        let table = RawTable::from_csv_reader(data.as_bytes()).unwrap();
        let record = &table.records[0];
        assert_eq!(record.vin, None);
        assert_eq!(record.county, None);
        assert_eq!(record.model_year, None);
        assert_eq!(record.ev_type, None);
        assert_eq!(record.electric_range, None);
        assert_eq!(record.base_msrp, None);
        assert_eq!(record.dol_vehicle_id, None);
        assert_eq!(record.vehicle_location, None);
        assert_eq!(record.census_tract, None);
        assert_eq!(record.city.as_deref(), Some("Seattle"));
    }

    #[test]
    fn test_non_finite_numbers_read_as_missing() {
        let data = format!("{HEADER}\nABC,King,Seattle,WA,98101,2020,TESLA,M3,,,inf,-NaN,,,,,\n");
        let table = RawTable::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(table.records[0].electric_range, None);
        assert_eq!(table.records[0].base_msrp, None);
    }

    #[test]
    fn test_non_finite_value_counts_as_missing() {
        let record = RawRecord {
            base_msrp: Some(f64::NAN),
            electric_range: Some(220.0),
            ..Default::default()
        };
        assert!(record.is_missing(COL_BASE_MSRP));
        assert!(!record.is_missing(COL_ELECTRIC_RANGE));
    }

    #[test]
    fn test_missing_counts() {
        let table = RawTable::from_records(vec![
            RawRecord {
                make: Some("TESLA".into()),
                ..Default::default()
            },
            RawRecord::default(),
        ]);

        let counts = table.missing_counts();
        let make = counts.iter().find(|(c, _)| c == COL_MAKE).unwrap();
        let vin = counts.iter().find(|(c, _)| c == COL_VIN).unwrap();
        assert_eq!(make.1, 1);
        assert_eq!(vin.1, 2);
    }
}
