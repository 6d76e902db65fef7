//! Run the EV registration warehouse build.
//!
//! ## Usage
//!
//! ```sh
//! ev-warehouse
//! ev-warehouse --export-csv
//! ev-warehouse --source-file rows.csv --db-path /tmp/ev.db --log-format json
//! ev-warehouse --config warehouse.json --export-csv
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use evwarehouse::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about = "Build the EV registration star-schema warehouse")]
struct Args {
    /// Also write one CSV file per table to the output directory.
    #[arg(long)]
    export_csv: bool,

    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Download the dataset from this URL.
    #[arg(long, conflicts_with = "source_file")]
    source_url: Option<String>,

    /// Read the dataset from a local CSV file instead of downloading it.
    #[arg(long)]
    source_file: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Directory for CSV exports.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormatArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

impl Args {
    fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => PipelineConfig::new(),
        };

        if let Some(url) = self.source_url {
            config = config.with_source_url(url);
        }
        if let Some(path) = self.source_file {
            config = config.with_source_file(path);
        }
        if let Some(path) = self.db_path {
            config = config.with_database_path(path);
        }
        if let Some(dir) = self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(format) = self.log_format {
            config = config.with_log_format(format.into());
        }
        if self.export_csv {
            config = config.with_export_csv(true);
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_tracing(config.log_format);
    tracing::info!(version = evwarehouse::VERSION, source = %config.source, "ev-warehouse");

    let outcome = run(&config).await.context("warehouse pipeline failed")?;

    let export_dir = config.export_csv.then_some(config.output_dir.as_path());
    for line in outcome.summary.banner(&config.database_path, export_dir) {
        tracing::info!("{line}");
    }
    Ok(())
}
