//! Pipeline configuration.
//!
//! Every setting has a fixed default; callers override through a JSON file
//! ([`PipelineConfig::from_json_file`]) or the `with_*` builder methods.

use crate::errors::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, TryFromFloatSecsError};

/// Public download URL of the Washington State EV population dataset.
pub const DEFAULT_SOURCE_URL: &str =
    "https://data.wa.gov/api/views/f6w7-q2d2/rows.csv?accessType=DOWNLOAD";

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Download over HTTP(S).
    Url(String),
    /// Read a CSV file already on disk.
    File(PathBuf),
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Url(DEFAULT_SOURCE_URL.to_string())
    }
}

impl std::fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Settings for the HTTP download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds. Must be finite and positive.
    #[serde(default = "default_timeout", deserialize_with = "positive_seconds")]
    pub timeout_seconds: f64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> f64 {
    300.0
}

fn positive_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(de::Error::custom(format!(
            "timeout_seconds must be a positive number of seconds, got {seconds}"
        )))
    }
}

fn default_user_agent() -> String {
    concat!("evwarehouse/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Gets timeout as Duration.
    ///
    /// Fails for negative, NaN or overflowing values.
    pub fn timeout(&self) -> Result<Duration, TryFromFloatSecsError> {
        Duration::try_from_secs_f64(self.timeout_seconds)
    }
}

/// How the loader groups its writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// One transaction per table. A failure part-way leaves earlier tables
    /// committed.
    #[default]
    PerTable,
    /// All tables and indexes in a single transaction.
    Atomic,
}

/// Digest used to pseudonymize the VIN prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// MD5, matching the historical warehouse output.
    #[default]
    Md5,
    /// SHA-256.
    Sha256,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Configuration for a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Dataset source.
    #[serde(default)]
    pub source: SourceConfig,
    /// HTTP settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Where the intermediate copy of the payload is written.
    #[serde(default = "default_download_path")]
    pub download_path: PathBuf,
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Directory for flat-file exports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Whether the CSV export stage runs.
    #[serde(default)]
    pub export_csv: bool,
    /// Transaction grouping for the loader.
    #[serde(default)]
    pub load_mode: LoadMode,
    /// VIN hash digest.
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_download_path() -> PathBuf {
    PathBuf::from("temp_ev_data.csv")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("ev_data_warehouse.db")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data_warehouse_output")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            fetch: FetchConfig::default(),
            download_path: default_download_path(),
            database_path: default_database_path(),
            output_dir: default_output_dir(),
            export_csv: false,
            load_mode: LoadMode::default(),
            hash_algorithm: HashAlgorithm::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Sets the source URL.
    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source = SourceConfig::Url(url.into());
        self
    }

    /// Sets a local source file.
    #[must_use]
    pub fn with_source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = SourceConfig::File(path.into());
        self
    }

    /// Sets the intermediate download path.
    #[must_use]
    pub fn with_download_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_path = path.into();
        self
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Sets the export directory.
    #[must_use]
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Enables or disables the CSV export.
    #[must_use]
    pub fn with_export_csv(mut self, export: bool) -> Self {
        self.export_csv = export;
        self
    }

    /// Sets the load mode.
    #[must_use]
    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    /// Sets the VIN hash algorithm.
    #[must_use]
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Sets the log format.
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }
}
