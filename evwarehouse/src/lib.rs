//! # EV Warehouse
//!
//! Builds a star-schema data warehouse from the Washington State electric
//! vehicle registration dataset.
//!
//! A run moves through fixed stages, each consuming the previous stage's
//! output:
//!
//! - **Extract**: fetch the CSV (HTTP or local file), keep a local copy, parse
//! - **Explore**: descriptive statistics and missing-value analysis
//! - **Clean**: impute missing values, encode classifications, derive fields
//! - **Model**: four deduplicated dimensions and a fact table
//! - **Load**: replace the tables in a `SQLite` database and index them
//! - **Export**: optionally write one CSV per table
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evwarehouse::prelude::*;
//!
//! let config = PipelineConfig::new()
//!     .with_database_path("ev_data_warehouse.db")
//!     .with_export_csv(true);
//!
//! let outcome = run(&config).await?;
//! println!("{}", outcome.summary.retention_display());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod explore;
pub mod export;
pub mod extract;
pub mod load;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod testing;
pub mod transform;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        FetchConfig, HashAlgorithm, LoadMode, LogFormat, PipelineConfig, SourceConfig,
    };
    pub use crate::errors::{
        ConfigError, ExportError, ExtractionError, ModelError, PersistenceError, WarehouseError,
    };
    pub use crate::explore::{explore, ExplorationReport};
    pub use crate::export::export_csv;
    pub use crate::extract::{extract, DatasetSource, FileSource, RawRecord, RawTable};
    pub use crate::load::{LoadReport, WarehouseStore};
    pub use crate::model::{build_model, DimensionalModel, Dimensions, FactTable};
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{run, run_with_source, PipelineOutcome, StageRecord, StageStatus};
    pub use crate::report::Summary;
    pub use crate::transform::{clean, CleanedRecord, CleanedTable, TransformOptions};

    #[cfg(feature = "http")]
    pub use crate::extract::HttpSource;
}

/// Version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
