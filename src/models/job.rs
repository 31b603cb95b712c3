use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{JobTrackerError, Result};
use crate::registry::JobType;
use crate::state_machine::{JobEvent, JobState};

/// One unit of dispatched remote work, owned by the runner driving it.
///
/// Timestamps are `None` until the corresponding transition happened:
/// `started_at` is set iff the job was dequeued and `finished_at` iff it
/// reached a terminal outcome other than cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: JobType,
    pub args: Value,
    pending_since: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    canceled: bool,
    state: JobState,
}

impl Job {
    /// Create a freshly submitted job
    pub fn new(job_type: JobType, args: Value, pending_since: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type,
            args,
            pending_since: Some(pending_since),
            started_at: None,
            finished_at: None,
            canceled: false,
            state: JobState::Pending,
        }
    }

    pub fn pending_since(&self) -> Option<DateTime<Utc>> {
        self.pending_since
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Pending -> Running
    pub fn mark_dequeued(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(JobEvent::Dequeue)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// Pending | Running -> Canceled
    pub fn mark_canceled(&mut self) -> Result<()> {
        self.transition(JobEvent::Cancel)?;
        self.canceled = true;
        Ok(())
    }

    /// Running -> Finished
    pub fn mark_finished(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(JobEvent::Finish)?;
        self.finished_at = Some(at);
        Ok(())
    }

    /// Check whether `event` is legal from the current state without applying it
    pub fn can_apply(&self, event: JobEvent) -> bool {
        self.state.next(event).is_some()
    }

    fn transition(&mut self, event: JobEvent) -> Result<()> {
        let next = self
            .state
            .next(event)
            .ok_or(JobTrackerError::InvalidTransition {
                job_id: self.id,
                from: self.state,
                event,
            })?;
        self.state = next;
        Ok(())
    }
}
