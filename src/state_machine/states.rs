use serde::{Deserialize, Serialize};
use std::fmt;

use super::events::JobEvent;

/// Lifecycle state of a single job as seen by the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Submitted and waiting to be dispatched to a worker
    Pending,
    /// Dispatched; the work function is executing
    Running,
    /// Work function returned and the outcome was recorded
    Finished,
    /// Canceled out-of-band, either before or during execution
    Canceled,
}

impl JobState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Canceled)
    }

    /// Resolve the state reached by applying `event`, or `None` if the
    /// transition is not part of the legal set.
    pub fn next(self, event: JobEvent) -> Option<JobState> {
        match (self, event) {
            (Self::Pending, JobEvent::Dequeue) => Some(Self::Running),
            (Self::Pending, JobEvent::Cancel) => Some(Self::Canceled),
            (Self::Running, JobEvent::Cancel) => Some(Self::Canceled),
            (Self::Running, JobEvent::Finish) => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

/// Default state for newly submitted jobs
impl Default for JobState {
    fn default() -> Self {
        Self::Pending
    }
}
