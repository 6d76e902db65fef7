//! Sample datasets.

use std::io;
use std::path::Path;

use crate::extract::{RawRecord, RawTable};
use crate::model::{DimensionTable, Dimensions, UtilityRow};
use crate::transform::{encode_cafv, encode_ev_type, model_decade, CleanedRecord, YearCategory};

/// The sample dataset as delimited text, header included.
///
/// Row 2 has no range, price or vehicle type; row 3 has a zero price.
pub const SAMPLE_CSV: &str = "\
VIN (1-10),County,City,State,Postal Code,Model Year,Make,Model,Electric Vehicle Type,\
Clean Alternative Fuel Vehicle (CAFV) Eligibility,Electric Range,Base MSRP,Legislative District,\
DOL Vehicle ID,Vehicle Location,Electric Utility,2020 Census Tract
5YJ3E1EA7K,King,Seattle,WA,98101,2020,TESLA,MODEL 3,Battery Electric Vehicle (BEV),\
Clean Alternative Fuel Vehicle Eligible,150,40000,43,1001,POINT (-122.33 47.60),CITY OF SEATTLE,53033007300
5YJ3E1EA8L,King,Seattle,WA,98101,2020,TESLA,MODEL 3,,\
Eligibility unknown as battery range has not been researched,,,43,1002,POINT (-122.33 47.60),CITY OF SEATTLE,53033007300
1N4AZ0CP5D,Kitsap,Bremerton,WA,98310,2010,NISSAN,LEAF,Plug-in Hybrid Electric Vehicle (PHEV),\
Not eligible due to low battery range,60,0,23,1003,POINT (-122.63 47.57),PUGET SOUND ENERGY INC,53035080500
";

#[allow(clippy::too_many_arguments)]
fn sample_record(
    vin: &str,
    place: (&str, &str, &str, &str, &str),
    year: i32,
    vehicle: (&str, &str, Option<&str>, &str),
    range: Option<f64>,
    msrp: Option<f64>,
    dol_vehicle_id: i64,
    point: &str,
    utility: &str,
) -> RawRecord {
    let (county, city, postal_code, district, tract) = place;
    let (make, model, ev_type, cafv) = vehicle;
    RawRecord {
        vin: Some(vin.to_string()),
        county: Some(county.to_string()),
        city: Some(city.to_string()),
        state: Some("WA".to_string()),
        postal_code: Some(postal_code.to_string()),
        model_year: Some(year),
        make: Some(make.to_string()),
        model: Some(model.to_string()),
        ev_type: ev_type.map(str::to_string),
        cafv_eligibility: Some(cafv.to_string()),
        electric_range: range,
        base_msrp: msrp,
        legislative_district: Some(district.to_string()),
        dol_vehicle_id: Some(dol_vehicle_id),
        vehicle_location: Some(point.to_string()),
        electric_utility: Some(utility.to_string()),
        census_tract: Some(tract.to_string()),
    }
}

/// The records of [`SAMPLE_CSV`], as parsing would produce them.
#[must_use]
pub fn sample_raw_table() -> RawTable {
    let seattle = ("King", "Seattle", "98101", "43", "53033007300");
    let bremerton = ("Kitsap", "Bremerton", "98310", "23", "53035080500");

    RawTable::from_records(vec![
        sample_record(
            "5YJ3E1EA7K",
            seattle,
            2020,
            (
                "TESLA",
                "MODEL 3",
                Some("Battery Electric Vehicle (BEV)"),
                "Clean Alternative Fuel Vehicle Eligible",
            ),
            Some(150.0),
            Some(40000.0),
            1001,
            "POINT (-122.33 47.60)",
            "CITY OF SEATTLE",
        ),
        sample_record(
            "5YJ3E1EA8L",
            seattle,
            2020,
            (
                "TESLA",
                "MODEL 3",
                None,
                "Eligibility unknown as battery range has not been researched",
            ),
            None,
            None,
            1002,
            "POINT (-122.33 47.60)",
            "CITY OF SEATTLE",
        ),
        sample_record(
            "1N4AZ0CP5D",
            bremerton,
            2010,
            (
                "NISSAN",
                "LEAF",
                Some("Plug-in Hybrid Electric Vehicle (PHEV)"),
                "Not eligible due to low battery range",
            ),
            Some(60.0),
            Some(0.0),
            1003,
            "POINT (-122.63 47.57)",
            "PUGET SOUND ENERGY INC",
        ),
    ])
}

/// Writes [`SAMPLE_CSV`] to `path`.
pub fn write_sample_csv(path: &Path) -> io::Result<()> {
    std::fs::write(path, SAMPLE_CSV)
}

/// A fully populated cleaned BEV record in Seattle.
#[must_use]
pub fn cleaned_record(make: &str, model: &str, year: i32) -> CleanedRecord {
    let ev_type = "Battery Electric Vehicle (BEV)".to_string();
    let cafv_eligibility = "Clean Alternative Fuel Vehicle Eligible".to_string();
    CleanedRecord {
        vin: Some("5YJ3E1EA7K".to_string()),
        county: "King".to_string(),
        city: "Seattle".to_string(),
        state: Some("WA".to_string()),
        postal_code: "98101".to_string(),
        model_year: Some(year),
        make: make.to_string(),
        model: model.to_string(),
        ev_type_code: encode_ev_type(&ev_type),
        cafv_code: encode_cafv(&cafv_eligibility),
        ev_type,
        cafv_eligibility,
        electric_range: Some(220.0),
        base_msrp: 0.0,
        legislative_district: "43".to_string(),
        dol_vehicle_id: Some(478_934),
        vehicle_location: Some("POINT (-122.33 47.60)".to_string()),
        electric_utility: "CITY OF SEATTLE".to_string(),
        census_tract: "53033007300".to_string(),
        model_decade: Some(model_decade(year)),
        year_category: YearCategory::from_year(year, 2026),
        vin_hash: "2a060519b9".to_string(),
    }
}

/// Dimensions built from `records`, except that `dim_utility` lists the
/// first record's utility twice.
#[must_use]
pub fn duplicate_utility_dimensions(records: &[CleanedRecord]) -> Dimensions {
    let name = records
        .first()
        .map_or_else(String::new, |r| r.electric_utility.clone());

    Dimensions {
        location: DimensionTable::build(records),
        vehicle: DimensionTable::build(records),
        utility: DimensionTable::from_rows(vec![
            UtilityRow {
                utility_id: 1,
                utility_name: name.clone(),
            },
            UtilityRow {
                utility_id: 2,
                utility_name: name,
            },
        ]),
        time: DimensionTable::build(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_csv_matches_records() {
        let parsed = RawTable::from_csv_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(parsed, sample_raw_table());
    }
}
