//! Run summary: row counts per stage and retention.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::RawTable;
use crate::model::{DimensionalModel, UnmatchedKeys, FACT_TABLE};
use crate::pipeline::StageRecord;
use crate::transform::CleanedTable;

/// Rows in one warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    /// Table name.
    pub table: String,
    /// Row count.
    pub rows: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the summary was produced.
    pub finished_at: DateTime<Utc>,
    /// Rows extracted.
    pub raw_rows: usize,
    /// Columns in the extracted header.
    pub raw_columns: usize,
    /// Rows after cleaning.
    pub cleaned_rows: usize,
    /// Row counts for every dimension, then the fact table.
    pub tables: Vec<TableCount>,
    /// Fact foreign keys left unmatched.
    pub unmatched: UnmatchedKeys,
    /// `cleaned_rows / raw_rows * 100`, or 0 with no raw rows.
    pub retention_percent: f64,
    /// Stage outcomes in execution order.
    pub stages: Vec<StageRecord>,
}

/// `cleaned / raw * 100`; 0 when there are no raw rows.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn retention_percent(raw_rows: usize, cleaned_rows: usize) -> f64 {
    if raw_rows == 0 {
        return 0.0;
    }
    cleaned_rows as f64 / raw_rows as f64 * 100.0
}

impl Summary {
    /// Collects counts from each stage's output.
    #[must_use]
    pub fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        raw: &RawTable,
        cleaned: &CleanedTable,
        model: &DimensionalModel,
        stages: Vec<StageRecord>,
    ) -> Self {
        let mut tables: Vec<TableCount> = model
            .dimensions
            .counts()
            .iter()
            .map(|(table, rows)| TableCount {
                table: (*table).to_string(),
                rows: *rows,
            })
            .collect();
        tables.push(TableCount {
            table: FACT_TABLE.to_string(),
            rows: model.fact.len(),
        });

        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            raw_rows: raw.len(),
            raw_columns: raw.column_count(),
            cleaned_rows: cleaned.len(),
            tables,
            unmatched: model.fact.unmatched,
            retention_percent: retention_percent(raw.len(), cleaned.len()),
            stages,
        }
    }

    /// Retention with one decimal, e.g. `"100.0%"`.
    #[must_use]
    pub fn retention_display(&self) -> String {
        format!("{:.1}%", self.retention_percent)
    }

    /// Rows in `table`, if it is part of the summary.
    #[must_use]
    pub fn rows(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }

    /// Logs the summary, one event per line.
    pub fn log(&self) {
        tracing::info!(run_id = %self.run_id, "DATA WAREHOUSE SUMMARY");
        tracing::info!(
            rows = self.raw_rows,
            columns = self.raw_columns,
            "Original dataset"
        );
        tracing::info!(rows = self.cleaned_rows, "Cleaned dataset");
        for t in &self.tables {
            tracing::info!(table = %t.table, rows = t.rows, "Table records");
        }
        tracing::info!(retention = %self.retention_display(), "Data quality: retention");
    }

    /// Closing lines describing where the warehouse landed.
    #[must_use]
    pub fn banner(&self, database_path: &Path, export_dir: Option<&Path>) -> Vec<String> {
        let mut lines = vec![
            "Data warehouse pipeline completed successfully".to_string(),
            format!("Database: {}", database_path.display()),
        ];
        if let Some(dir) = export_dir {
            lines.push(format!("CSV files: {}", dir.display()));
        }
        lines.push(format!(
            "Star schema: {} dimension tables + 1 fact table",
            self.tables.len().saturating_sub(1)
        ));
        lines
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
