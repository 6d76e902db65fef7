//! Extraction: retrieve the source payload and materialize it as a table.
//!
//! The payload is first written to a local copy, then parsed from that copy.

mod raw;

pub use raw::{
    is_na_token, RawRecord, RawTable, COL_BASE_MSRP, COL_CAFV, COL_CENSUS_TRACT, COL_CITY,
    COL_COUNTY, COL_DOL_VEHICLE_ID, COL_ELECTRIC_RANGE, COL_ELECTRIC_UTILITY, COL_EV_TYPE,
    COL_LEGISLATIVE_DISTRICT, COL_MAKE, COL_MODEL, COL_MODEL_YEAR, COL_POSTAL_CODE, COL_STATE,
    COL_VEHICLE_LOCATION, COL_VIN, NA_TOKENS, REQUIRED_COLUMNS,
};

use crate::config::{FetchConfig, SourceConfig};
use crate::errors::ExtractionError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Somewhere the raw dataset can be fetched from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn describe(&self) -> String;

    /// Retrieves the full payload.
    async fn fetch(&self) -> Result<Vec<u8>, ExtractionError>;
}

/// Downloads the dataset over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    fetch: FetchConfig,
}

#[cfg(feature = "http")]
impl HttpSource {
    /// Creates a new HTTP source.
    #[must_use]
    pub fn new(url: impl Into<String>, fetch: FetchConfig) -> Self {
        Self {
            url: url.into(),
            fetch,
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl DatasetSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>, ExtractionError> {
        let transfer = |e: reqwest::Error| ExtractionError::transfer(&self.url, e.to_string());
        let timeout = self.fetch.timeout().map_err(|e| {
            ExtractionError::transfer(&self.url, format!("invalid request timeout: {e}"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(&self.fetch.user_agent)
            .build()
            .map_err(transfer)?;

        tracing::debug!(url = %self.url, "Sending dataset request");
        let response = client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(transfer)?;

        let bytes = response.bytes().await.map_err(transfer)?;
        Ok(bytes.to_vec())
    }
}

/// Reads the dataset from a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a new file source.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>, ExtractionError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| ExtractionError::transfer(self.describe(), e.to_string()))
    }
}

/// Builds the source named by the configuration.
#[must_use]
pub fn source_from_config(source: &SourceConfig, fetch: &FetchConfig) -> Box<dyn DatasetSource> {
    match source {
        #[cfg(feature = "http")]
        SourceConfig::Url(url) => Box::new(HttpSource::new(url.clone(), fetch.clone())),
        #[cfg(not(feature = "http"))]
        SourceConfig::Url(url) => {
            let _ = fetch;
            Box::new(UnsupportedSource(url.clone()))
        }
        SourceConfig::File(path) => Box::new(FileSource::new(path.clone())),
    }
}

#[cfg(not(feature = "http"))]
struct UnsupportedSource(String);

#[cfg(not(feature = "http"))]
#[async_trait]
impl DatasetSource for UnsupportedSource {
    fn describe(&self) -> String {
        self.0.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>, ExtractionError> {
        Err(ExtractionError::transfer(
            &self.0,
            "built without the `http` feature",
        ))
    }
}

/// Fetches the dataset, writes the local copy, and parses it.
pub async fn extract(
    source: &dyn DatasetSource,
    download_path: &Path,
) -> Result<RawTable, ExtractionError> {
    let location = source.describe();
    tracing::info!(source = %location, "Extracting dataset");

    let payload = source.fetch().await?;

    let local_copy = |source: std::io::Error| ExtractionError::LocalCopy {
        path: download_path.to_path_buf(),
        source,
    };
    if let Some(parent) = download_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(local_copy)?;
    }
    tokio::fs::write(download_path, &payload)
        .await
        .map_err(local_copy)?;
    tracing::debug!(
        path = %download_path.display(),
        bytes = payload.len(),
        "Wrote local copy"
    );

    let copy = tokio::fs::read(download_path).await.map_err(local_copy)?;
    let table = RawTable::from_csv_reader(copy.as_slice())?;

    tracing::info!(
        rows = table.len(),
        columns = table.column_count(),
        "Successfully extracted records"
    );
    tracing::info!(columns = ?table.columns, "Dataset columns");

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "VIN (1-10),County,City,State,Postal Code,Model Year,Make,Model,\
Electric Vehicle Type,Clean Alternative Fuel Vehicle (CAFV) Eligibility,Electric Range,\
Base MSRP,Legislative District,DOL Vehicle ID,Vehicle Location,Electric Utility,2020 Census Tract\n\
5YJ3E1EA7K,King,Seattle,WA,98101,2019,TESLA,MODEL 3,Battery Electric Vehicle (BEV),\
Clean Alternative Fuel Vehicle Eligible,220,0,43,478934,POINT (-122.33 47.60),CITY OF SEATTLE,53033007300\n";

    #[tokio::test]
    async fn test_extract_writes_local_copy_and_parses() {
        let dir = tempfile::tempdir().unwrap();
        let download = dir.path().join("nested").join("copy.csv");

        let mut source = MockDatasetSource::new();
        source.expect_describe().return_const("mock://ev".to_string());
        source
            .expect_fetch()
            .times(1)
            .returning(|| Ok(SAMPLE.as_bytes().to_vec()));

        let table = extract(&source, &download).await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(std::fs::read_to_string(&download).unwrap(), SAMPLE);
    }

    #[tokio::test]
    async fn test_extract_propagates_transfer_error() {
        let dir = tempfile::tempdir().unwrap();

        let mut source = MockDatasetSource::new();
        source.expect_describe().return_const("mock://down".to_string());
        source
            .expect_fetch()
            .returning(|| Err(ExtractionError::transfer("mock://down", "connection refused")));

        let err = extract(&source, &dir.path().join("copy.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Transfer { .. }));
        assert!(!dir.path().join("copy.csv").exists());
    }

    #[tokio::test]
    async fn test_extract_rejects_unparseable_payload() {
        let dir = tempfile::tempdir().unwrap();

        let mut source = MockDatasetSource::new();
        source.expect_describe().return_const("mock://html".to_string());
        source
            .expect_fetch()
            .returning(|| Ok(b"<html>not a table</html>".to_vec()));

        let err = extract(&source, &dir.path().join("copy.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MissingColumns { .. }));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_http_source_rejects_invalid_timeout() {
        let fetch = FetchConfig {
            timeout_seconds: -1.0,
            ..FetchConfig::default()
        };
        let source = HttpSource::new("http://127.0.0.1:9/ev.csv", fetch);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ExtractionError::Transfer { .. }));
        assert!(err.to_string().contains("invalid request timeout"));
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileSource::new("/nonexistent/ev.csv");
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ev.csv"));
    }

    #[tokio::test]
    async fn test_file_source_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, SAMPLE).unwrap();

        let source =
            source_from_config(&SourceConfig::File(input.clone()), &FetchConfig::default());
        assert_eq!(source.describe(), input.display().to_string());

        let table = extract(source.as_ref(), &dir.path().join("copy.csv"))
            .await
            .unwrap();
        assert_eq!(table.records[0].make.as_deref(), Some("TESLA"));
    }
}
