//! Diagnostic profiling of the raw dataset.
//!
//! Nothing here feeds the downstream stages; an empty field degrades to a
//! logged notice instead of an error.

mod stats;

pub use stats::{median, quantile, SummaryStats};

use crate::extract::{RawRecord, RawTable, COL_BASE_MSRP, COL_ELECTRIC_RANGE, COL_MODEL_YEAR};
use serde::{Deserialize, Serialize};

/// Which values of a field count as measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePolicy {
    /// Every non-missing value.
    NonMissing,
    /// Non-missing and strictly positive; zero means "unset".
    PositiveOnly,
}

/// Statistics for a single numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    /// Source column name.
    pub field: String,
    /// Filtering applied before computing statistics.
    pub policy: ValuePolicy,
    /// `None` when no valid data remained.
    pub stats: Option<SummaryStats>,
}

/// Missing-value count for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValues {
    /// Source column name.
    pub column: String,
    /// Number of empty cells.
    pub count: usize,
    /// Share of rows that are empty, in percent.
    pub percent: f64,
}

/// Result of the exploration stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationReport {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub columns: usize,
    /// Columns with at least one missing value, most missing first.
    pub missing: Vec<MissingValues>,
    /// Per-field statistics for model year, electric range and base MSRP.
    pub fields: Vec<FieldProfile>,
}

impl ExplorationReport {
    /// Looks up a field profile by column name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldProfile> {
        self.fields.iter().find(|f| f.field == name)
    }
}

type Extractor = fn(&RawRecord) -> Option<f64>;

fn model_year(r: &RawRecord) -> Option<f64> {
    r.model_year.map(f64::from)
}

fn electric_range(r: &RawRecord) -> Option<f64> {
    r.electric_range.filter(|v| v.is_finite())
}

fn base_msrp(r: &RawRecord) -> Option<f64> {
    r.base_msrp.filter(|v| v.is_finite())
}

const PROFILED_FIELDS: [(&str, ValuePolicy, Extractor); 3] = [
    (COL_MODEL_YEAR, ValuePolicy::NonMissing, model_year),
    (COL_ELECTRIC_RANGE, ValuePolicy::PositiveOnly, electric_range),
    (COL_BASE_MSRP, ValuePolicy::PositiveOnly, base_msrp),
];

/// Profiles the raw table.
#[must_use]
pub fn explore(raw: &RawTable) -> ExplorationReport {
    tracing::info!(rows = raw.len(), columns = raw.column_count(), "Exploring dataset");

    let missing = missing_values(raw);
    for m in &missing {
        tracing::info!(
            column = %m.column,
            count = m.count,
            percent = format_args!("{:.2}", m.percent),
            "Missing values"
        );
    }

    let fields = PROFILED_FIELDS
        .iter()
        .map(|(name, policy, extract)| profile_field(raw, name, *policy, *extract))
        .collect();

    ExplorationReport {
        rows: raw.len(),
        columns: raw.column_count(),
        missing,
        fields,
    }
}

fn missing_values(raw: &RawTable) -> Vec<MissingValues> {
    let rows = raw.len();
    let mut missing: Vec<MissingValues> = raw
        .missing_counts()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(column, count)| {
            #[allow(clippy::cast_precision_loss)]
            let percent = count as f64 / rows as f64 * 100.0;
            MissingValues {
                column,
                count,
                percent,
            }
        })
        .collect();
    // Stable sort keeps header order among equal counts.
    missing.sort_by(|a, b| b.count.cmp(&a.count));
    missing
}

fn profile_field(
    raw: &RawTable,
    name: &str,
    policy: ValuePolicy,
    extract: Extractor,
) -> FieldProfile {
    let values: Vec<f64> = raw
        .records
        .iter()
        .filter_map(extract)
        .filter(|v| match policy {
            ValuePolicy::NonMissing => true,
            ValuePolicy::PositiveOnly => *v > 0.0,
        })
        .collect();

    let stats = SummaryStats::compute(&values);
    match &stats {
        Some(s) => tracing::info!(
            field = name,
            count = s.count,
            mean = format_args!("{:.2}", s.mean),
            median = format_args!("{:.2}", s.median),
            mode = s.mode,
            min = s.min,
            max = s.max,
            iqr = format_args!("{:.2}", s.iqr),
            std_dev = ?s.std_dev,
            variance = ?s.variance,
            cv_percent = ?s.coefficient_of_variation,
            "Field statistics"
        ),
        None => tracing::info!(field = name, "No valid data available"),
    }

    FieldProfile {
        field: name.to_string(),
        policy,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: Option<i32>, range: Option<f64>, msrp: Option<f64>) -> RawRecord {
        RawRecord {
            model_year: year,
            electric_range: range,
            base_msrp: msrp,
            ..Default::default()
        }
    }

    #[test]
    fn test_positive_only_drops_zero_and_missing() {
        let raw = RawTable::from_records(vec![
            record(Some(2020), Some(150.0), Some(40000.0)),
            record(Some(2020), None, None),
            record(Some(2010), Some(60.0), Some(0.0)),
            record(None, Some(0.0), Some(-5.0)),
        ]);

        let report = explore(&raw);

        let year = report.field(COL_MODEL_YEAR).unwrap().stats.as_ref().unwrap();
        assert_eq!(year.count, 3);

        let range = report.field(COL_ELECTRIC_RANGE).unwrap().stats.as_ref().unwrap();
        assert_eq!(range.count, 2);
        assert!((range.median - 105.0).abs() < 1e-9);

        let msrp = report.field(COL_BASE_MSRP).unwrap().stats.as_ref().unwrap();
        assert_eq!(msrp.count, 1);
        assert!(msrp.std_dev.is_none());
    }

    #[test]
    fn test_all_values_dropped_reports_no_data() {
        let raw = RawTable::from_records(vec![
            record(Some(2020), Some(0.0), Some(0.0)),
            record(Some(2021), None, None),
        ]);

        let report = explore(&raw);
        assert!(report.field(COL_ELECTRIC_RANGE).unwrap().stats.is_none());
        assert!(report.field(COL_BASE_MSRP).unwrap().stats.is_none());
    }

    #[test]
    fn test_missing_values_sorted_descending() {
        let raw = RawTable::from_records(vec![
            record(Some(2020), None, None),
            record(None, None, Some(1.0)),
        ]);

        let report = explore(&raw);
        let range = report
            .missing
            .iter()
            .find(|m| m.column == COL_ELECTRIC_RANGE)
            .unwrap();
        assert_eq!(range.count, 2);
        assert!((range.percent - 100.0).abs() < 1e-9);

        let counts: Vec<usize> = report.missing.iter().map(|m| m.count).collect();
        let mut sorted = counts.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(counts, sorted);
        assert!(report.missing.iter().all(|m| m.count > 0));
    }

    #[test]
    fn test_empty_table() {
        let report = explore(&RawTable::from_records(Vec::new()));
        assert_eq!(report.rows, 0);
        assert!(report.missing.is_empty());
        assert!(report.fields.iter().all(|f| f.stats.is_none()));
    }
}
