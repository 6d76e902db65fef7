//! Per-stage execution records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::observability::{SpanTimer, StageSpanAttributes};

/// Outcome of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Stage completed successfully.
    Completed,
    /// Stage failed; the run stops here.
    Failed,
    /// Stage was not requested.
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// What happened in one stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Stage status.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Wall-clock duration.
    pub duration_ms: f64,
    /// Rows produced, where meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    /// A stage that was not run.
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            status: StageStatus::Skipped,
            started_at: now,
            ended_at: now,
            duration_ms: 0.0,
            rows: None,
            error: None,
        }
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Completed
    }
}

/// Collects stage records for one run and emits a span event per stage.
#[derive(Debug)]
pub(crate) struct StageLog {
    run_id: String,
    records: Vec<StageRecord>,
}

/// A stage in progress.
pub(crate) struct StageHandle {
    timer: SpanTimer,
    started_at: DateTime<Utc>,
}

impl StageLog {
    pub(crate) fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            records: Vec::new(),
        }
    }

    pub(crate) fn begin(&self, name: &str) -> StageHandle {
        tracing::info!(stage = name, run_id = %self.run_id, "Stage started");
        StageHandle {
            timer: SpanTimer::start(name),
            started_at: Utc::now(),
        }
    }

    /// Records the stage outcome and passes the result through.
    pub(crate) fn finish<T, E: fmt::Display>(
        &mut self,
        handle: StageHandle,
        result: Result<T, E>,
        rows: impl FnOnce(&T) -> usize,
    ) -> Result<T, E> {
        let name = handle.timer.name().to_string();
        let duration_ms = handle.timer.finish();
        let mut attributes = StageSpanAttributes::new(&name)
            .with_run_id(&self.run_id)
            .with_duration_ms(duration_ms);

        let mut record = StageRecord {
            name,
            status: StageStatus::Completed,
            started_at: handle.started_at,
            ended_at: Utc::now(),
            duration_ms,
            rows: None,
            error: None,
        };

        match &result {
            Ok(value) => {
                let n = rows(value);
                record.rows = Some(n);
                attributes = attributes
                    .with_status(StageStatus::Completed.to_string())
                    .with_rows(n);
            }
            Err(e) => {
                record.status = StageStatus::Failed;
                record.error = Some(e.to_string());
                attributes = attributes
                    .with_status(StageStatus::Failed.to_string())
                    .with_error(e.to_string());
            }
        }

        attributes.emit();
        self.records.push(record);
        result
    }

    pub(crate) fn skip(&mut self, name: &str) {
        tracing::info!(stage = name, run_id = %self.run_id, "Stage skipped");
        self.records.push(StageRecord::skipped(name));
    }

    pub(crate) fn records(&self) -> &[StageRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(StageStatus::Completed.to_string(), "completed");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
        assert_eq!(StageStatus::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_finish_records_success() {
        let mut log = StageLog::new("run-1");
        let handle = log.begin("clean");
        let out: Result<Vec<u8>, String> = log.finish(handle, Ok(vec![1, 2, 3]), Vec::len);

        assert_eq!(out.unwrap().len(), 3);
        let record = &log.records()[0];
        assert!(record.is_success());
        assert_eq!(record.rows, Some(3));
        assert!(record.ended_at >= record.started_at);
    }

    #[test]
    fn test_finish_records_failure() {
        let mut log = StageLog::new("run-1");
        let handle = log.begin("load");
        let out: Result<usize, String> = log.finish(handle, Err("disk full".to_string()), |n| *n);

        assert!(out.is_err());
        let record = &log.records()[0];
        assert_eq!(record.status, StageStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("disk full"));
        assert_eq!(record.rows, None);
    }

    #[test]
    fn test_skip_serializes_without_optionals() {
        let mut log = StageLog::new("run-1");
        log.skip("export");
        let json = serde_json::to_value(&log.records()[0]).unwrap();
        assert_eq!(json["status"], "skipped");
        assert!(json.get("error").is_none());
        assert!(json.get("rows").is_none());
    }
}
