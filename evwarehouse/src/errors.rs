//! Error types for the warehouse pipeline.
//!
//! Each stage fails with its own error type; [`WarehouseError`] is the
//! umbrella returned by the pipeline runner. There is no retry anywhere:
//! errors are logged at the stage boundary and propagated to the caller.

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// The source dataset could not be retrieved or parsed.
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    /// The dimensional model violated a structural invariant.
    #[error("{0}")]
    Model(#[from] ModelError),

    /// Writing to the relational store failed.
    #[error("{0}")]
    Persistence(#[from] PersistenceError),

    /// Writing flat-file exports failed.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// The configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl WarehouseError {
    /// Returns a short machine-readable kind for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extraction",
            Self::Model(_) => "model",
            Self::Persistence(_) => "persistence",
            Self::Export(_) => "export",
            Self::Config(_) => "config",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), Value::String(self.kind().to_string()));
        map.insert("message".to_string(), Value::String(self.to_string()));
        map
    }
}

/// Errors raised while retrieving or parsing the source dataset.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The transfer itself failed (connection, status code, timeout).
    #[error("Failed to fetch dataset from {source_location}: {reason}")]
    Transfer {
        /// Where the dataset was requested from.
        source_location: String,
        /// What went wrong.
        reason: String,
    },

    /// The intermediate local copy could not be written or read.
    #[error("Local copy I/O failed at {}: {source}", .path.display())]
    LocalCopy {
        /// Path of the local copy.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The payload is not a table with the expected shape.
    #[error("Failed to parse dataset: {reason}")]
    Parse {
        /// What went wrong.
        reason: String,
        /// 1-based data row where parsing failed, when known.
        row: Option<u64>,
    },

    /// Required header columns are absent.
    #[error("Dataset is missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        /// Names of the missing columns.
        missing: Vec<String>,
    },
}

impl ExtractionError {
    /// Creates a transfer error.
    #[must_use]
    pub fn transfer(source_location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transfer {
            source_location: source_location.into(),
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(reason: impl Into<String>, row: Option<u64>) -> Self {
        Self::Parse {
            reason: reason.into(),
            row,
        }
    }
}

impl From<csv::Error> for ExtractionError {
    fn from(err: csv::Error) -> Self {
        let row = err.position().map(csv::Position::line);
        Self::parse(err.to_string(), row)
    }
}

/// Structural violations detected while building the dimensional model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A dimension table holds the same natural key twice, so a join against
    /// it would fan out.
    #[error("Dimension '{dimension}' has a duplicate natural key at surrogate key {surrogate_key}")]
    DuplicateNaturalKey {
        /// Dimension table name.
        dimension: String,
        /// Surrogate key of the second occurrence.
        surrogate_key: i64,
    },

    /// The fact table does not have one row per cleaned record.
    #[error("Fact table has {fact_rows} rows but {cleaned_rows} cleaned records were supplied")]
    CardinalityMismatch {
        /// Number of fact rows produced.
        fact_rows: usize,
        /// Number of cleaned records.
        cleaned_rows: usize,
    },
}

/// Errors raised while writing to the relational store.
#[derive(Debug, Error)]
#[error("Persistence failed during {operation}{}: {source}", table_suffix(.table.as_deref()))]
pub struct PersistenceError {
    /// What the loader was doing (open, create, insert, index, close...).
    pub operation: String,
    /// Table involved, if any.
    pub table: Option<String>,
    /// Underlying SQLite error.
    #[source]
    pub source: rusqlite::Error,
}

impl PersistenceError {
    /// Creates a new persistence error.
    #[must_use]
    pub fn new(operation: impl Into<String>, source: rusqlite::Error) -> Self {
        Self {
            operation: operation.into(),
            table: None,
            source,
        }
    }

    /// Sets the table involved.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// Errors raised while writing flat-file exports.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output directory or a file could not be created.
    #[error("Export I/O failed at {}: {source}", .path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A row could not be written as CSV.
    #[error("Failed to write {table} export: {source}")]
    Csv {
        /// Table being exported.
        table: String,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`crate::config::PipelineConfig`].
    #[error("Invalid config file {}: {source}", .path.display())]
    Invalid {
        /// Config file path.
        path: PathBuf,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

fn table_suffix(table: Option<&str>) -> String {
    table.map(|t| format!(" on '{t}'")).unwrap_or_default()
}

/// Result alias used across the crate.
pub type Result<T, E = WarehouseError> = std::result::Result<T, E>;
