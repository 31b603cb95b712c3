//! Error types for the job tracking core.
//!
//! Only infrastructure failures live here: a rejected lifecycle transition, a
//! result that could not be handed to the result sink, a metrics registry that
//! could not be built, or bad configuration. Why a job's remote work failed is
//! a job outcome and is modelled by [`crate::taxonomy::ErrorKind`] instead.

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigurationError;
use crate::state_machine::{JobEvent, JobState};

#[derive(Debug, Error)]
pub enum JobTrackerError {
    #[error("Invalid transition for job {job_id}: {event} is not allowed from {from}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobState,
        event: JobEvent,
    },

    #[error("Failed to report result for job {job_id}: {source}")]
    ResultReport {
        job_id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl From<prometheus::Error> for JobTrackerError {
    fn from(error: prometheus::Error) -> Self {
        JobTrackerError::Metrics(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JobTrackerError>;
