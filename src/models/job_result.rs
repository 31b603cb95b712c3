use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::registry::JobType;
use crate::taxonomy::ErrorKind;

/// Label used for jobs that finished without an error
pub const SUCCESS_STATUS: &str = "success";

/// Terminal classification of a finished job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    Success,
    Failure(ErrorKind),
}

impl OutcomeStatus {
    /// Metrics label: `success` or the stable error kind name
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Success => SUCCESS_STATUS,
            Self::Failure(kind) => kind.name(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success => None,
            Self::Failure(kind) => Some(*kind),
        }
    }

    /// Every possible status, for enumerating label values
    pub fn all() -> impl Iterator<Item = OutcomeStatus> {
        std::iter::once(Self::Success).chain(ErrorKind::ALL.into_iter().map(Self::Failure))
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl Serialize for OutcomeStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_label())
    }
}

/// Classified failure carried by a job result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobError {
    /// Stable numeric code of `kind`
    pub id: u16,
    pub kind: ErrorKind,
    /// Human readable reason derived from the kind
    pub reason: String,
    pub retryable: bool,
    /// Free-text diagnostics, never used for classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JobError {
    pub fn new(kind: ErrorKind, details: Option<String>) -> Self {
        Self {
            id: kind.code(),
            kind,
            reason: kind.message().to_string(),
            retryable: kind.is_retryable(),
            details,
        }
    }
}

/// Outcome of one finished job, reported to the result sink exactly once
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<JobError>,
    /// Opaque success payload from the work function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobResult {
    pub fn success(
        job_id: Uuid,
        job_type: JobType,
        payload: Value,
        started_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            job_id,
            job_type,
            status: OutcomeStatus::Success,
            job_error: None,
            payload: Some(payload),
            started_at,
            finished_at,
        }
    }

    pub fn failure(
        job_id: Uuid,
        job_type: JobType,
        error: JobError,
        started_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            job_id,
            job_type,
            status: OutcomeStatus::Failure(error.kind),
            job_error: Some(error),
            payload: None,
            started_at,
            finished_at,
        }
    }

    /// Wall-clock run time, if both ends are known
    pub fn run_duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}
