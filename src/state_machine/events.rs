use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that move a job through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEvent {
    /// A worker picked the job up
    Dequeue,
    /// The dispatch layer canceled the job
    Cancel,
    /// The work function returned and an outcome was derived
    Finish,
}

impl JobEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Dequeue => "dequeue",
            Self::Cancel => "cancel",
            Self::Finish => "finish",
        }
    }

    /// Check if this event always ends the lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancel | Self::Finish)
    }
}

impl fmt::Display for JobEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}
