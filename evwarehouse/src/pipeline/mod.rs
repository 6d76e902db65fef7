//! End-to-end warehouse run.
//!
//! Each stage consumes the value produced by the one before it:
//! extract → explore → clean → model → load → export (optional) → report.
//! A failure stops the run and is returned to the caller.

mod stage;


pub use stage::{StageRecord, StageStatus};

use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::errors::{Result, WarehouseError};
use crate::explore::{explore, ExplorationReport};
use crate::export::export_csv;
use crate::extract::{extract, source_from_config, DatasetSource, RawTable};
use crate::load::{self, LoadReport};
use crate::model::{build_model, DimensionalModel};
use crate::report::Summary;
use crate::transform::{clean, CleanedTable, TransformOptions};
use stage::StageLog;

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Counts, retention and stage records.
    pub summary: Summary,
    /// Diagnostic statistics over the raw table.
    pub exploration: ExplorationReport,
    /// The star schema that was loaded.
    pub model: DimensionalModel,
    /// Rows written per store table.
    pub load: LoadReport,
    /// CSV files written, empty when export was not requested.
    pub exports: Vec<PathBuf>,
}

/// Runs the pipeline against the source named in `config`.
pub async fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    let source = source_from_config(&config.source, &config.fetch);
    run_with_source(source.as_ref(), config, TransformOptions::default()).await
}

/// Runs the pipeline against an explicit source.
///
/// `options.hash_algorithm` is overridden by `config.hash_algorithm`.
pub async fn run_with_source(
    source: &dyn DatasetSource,
    config: &PipelineConfig,
    options: TransformOptions,
) -> Result<PipelineOutcome> {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, source = %source.describe(), "Starting EV data warehouse pipeline");

    let options = options.with_hash_algorithm(config.hash_algorithm);
    let result = execute(run_id, source, config, options).await;
    if let Err(e) = &result {
        tracing::error!(%run_id, kind = e.kind(), error = %e, "Pipeline failed");
    }
    result
}

async fn execute(
    run_id: Uuid,
    source: &dyn DatasetSource,
    config: &PipelineConfig,
    options: TransformOptions,
) -> Result<PipelineOutcome> {
    let started_at = Utc::now();
    let mut stages = StageLog::new(run_id.to_string());

    let handle = stages.begin("extract");
    let raw = stages.finish(
        handle,
        extract(source, &config.download_path).await,
        RawTable::len,
    )?;

    let handle = stages.begin("explore");
    let exploration = stages.finish(
        handle,
        Ok::<_, WarehouseError>(explore(&raw)),
        |r| r.rows,
    )?;

    let handle = stages.begin("clean");
    let cleaned = stages.finish(
        handle,
        Ok::<_, WarehouseError>(clean(&raw, options)),
        CleanedTable::len,
    )?;

    let handle = stages.begin("model");
    let model = stages.finish(handle, build_model(&cleaned), |m| m.fact.len())?;

    let handle = stages.begin("load");
    let load = stages.finish(
        handle,
        load::load(&model, &config.database_path, config.load_mode),
        |r| r.tables.iter().map(|(_, n)| n).sum(),
    )?;

    let exports = if config.export_csv {
        let handle = stages.begin("export");
        stages.finish(handle, export_csv(&model, &config.output_dir), Vec::len)?
    } else {
        stages.skip("export");
        Vec::new()
    };

    let summary = Summary::new(
        run_id,
        started_at,
        &raw,
        &cleaned,
        &model,
        stages.records().to_vec(),
    );
    summary.log();

    Ok(PipelineOutcome {
        summary,
        exploration,
        model,
        load,
        exports,
    })
}
