//! # Job Lifecycle Tracker
//!
//! Translates job state transitions into metric observations. The tracker is
//! aggregate-only: it never holds a reference to a job, only the job type and
//! the timestamps the caller hands it. Legal call order per job is
//! `enqueue -> dequeue -> (cancel | finish)`, with `enqueue -> cancel` for jobs
//! canceled before dispatch; enforcing that order is the runner's job.
//!
//! A transition whose timestamps are missing is not recorded. Instead of
//! skipping it silently the tracker logs a warning and counts it in
//! `skipped_observations_total`, so a job that never had a timestamp set
//! shows up on a dashboard rather than disappearing.
//!
//! The same goes for `finish` on a canceled job. An ignored `dequeue` or
//! `finish` leaves the gauges, histograms and `jobs_total` untouched; the one
//! counter it moves is `skipped_observations_total`, labelled with the
//! [`SkipReason`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::metrics::{MetricsSink, SkipReason};
use crate::models::OutcomeStatus;
use crate::registry::JobType;

/// Shared, cheaply cloneable handle used by every runner in the process
#[derive(Debug, Clone)]
pub struct JobLifecycleTracker {
    sink: Arc<MetricsSink>,
}

impl JobLifecycleTracker {
    pub fn new(sink: Arc<MetricsSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<MetricsSink> {
        &self.sink
    }

    /// Job entered Pending
    pub fn enqueue(&self, job_type: &JobType) {
        self.sink.increment_pending(job_type);
    }

    /// Pending -> Running. Returns whether the observation was recorded.
    pub fn dequeue(
        &self,
        job_type: &JobType,
        pending_since: Option<DateTime<Utc>>,
        started_at: Option<DateTime<Utc>>,
    ) -> bool {
        let (Some(pending_since), Some(started_at)) = (pending_since, started_at) else {
            warn!(
                job_type = %job_type,
                operation = "dequeue",
                has_pending_since = pending_since.is_some(),
                has_started_at = started_at.is_some(),
                "Skipping dequeue observation with missing timestamp"
            );
            self.sink
                .record_skipped(job_type, SkipReason::DequeueMissingTimestamp);
            return false;
        };

        self.sink
            .record_dequeue(job_type, seconds_between(pending_since, started_at));
        true
    }

    /// Pending | Running -> Canceled. A job with a start time was running.
    pub fn cancel(&self, job_type: &JobType, started_at: Option<DateTime<Utc>>) {
        self.sink.record_cancel(job_type, started_at.is_some());
    }

    /// Running -> Finished. Ignored for canceled jobs and jobs without both
    /// timestamps; returns whether the observation was recorded.
    pub fn finish(
        &self,
        job_type: &JobType,
        started_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
        canceled: bool,
        outcome: &OutcomeStatus,
    ) -> bool {
        if canceled {
            debug!(
                job_type = %job_type,
                operation = "finish",
                "Ignoring finish for canceled job"
            );
            self.sink
                .record_skipped(job_type, SkipReason::FinishAfterCancel);
            return false;
        }

        let (Some(started_at), Some(finished_at)) = (started_at, finished_at) else {
            warn!(
                job_type = %job_type,
                operation = "finish",
                outcome = %outcome,
                has_started_at = started_at.is_some(),
                has_finished_at = finished_at.is_some(),
                "Skipping finish observation with missing timestamp"
            );
            self.sink
                .record_skipped(job_type, SkipReason::FinishMissingTimestamp);
            return false;
        };

        self.sink
            .record_finish(job_type, outcome, seconds_between(started_at, finished_at));
        true
    }
}

/// Signed elapsed seconds with nanosecond resolution
fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let elapsed = to - from;
    match elapsed.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1_000_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    }
}
