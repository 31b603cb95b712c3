//! # Job Runner
//!
//! Drives a single job through its lifecycle exactly once:
//!
//! ```text
//! submit ──▶ enqueue            (Pending)
//! run    ──▶ dequeue            (Running)
//!        ──▶ WorkFunction::execute, never retried
//!        ──▶ canceled out-of-band?
//!              yes: cancel, stop            (Canceled)
//!              no:  classify, finish, report (Finished)
//! ```
//!
//! Every step goes through the job's own state tag before the tracker sees
//! it. An illegal step is returned as [`JobTrackerError::InvalidTransition`]
//! when strict transitions are on. Otherwise it is logged, the tracker call is
//! skipped, and a job that cannot be dispatched comes back as
//! [`JobOutcome::Rejected`] without its work being executed or reported.
//!
//! Job failures are outcomes, not errors: they end up classified inside the
//! returned [`JobResult`]. `run` only fails on infrastructure problems such as
//! a result that could not be reported.

pub mod cancellation;
pub mod clock;
pub mod traits;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::RunnerConfig;
use crate::error::{JobTrackerError, Result};
use crate::logging::{log_error, log_job_operation};
use crate::models::{Job, JobError, JobResult};
use crate::registry::JobTypeRegistry;
use crate::state_machine::JobEvent;
use crate::taxonomy::{ErrorClassifier, StandardErrorClassifier};
use crate::tracker::JobLifecycleTracker;

pub use cancellation::CancellationRegistry;
pub use clock::{Clock, ManualClock, SystemClock};
pub use traits::{ResultSink, WorkFunction};

/// How a run ended
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The work function returned; the result was reported
    Finished(JobResult),
    /// Canceled out-of-band; nothing was reported
    Canceled(Job),
    /// Not in a dispatchable state (already canceled, running or finished);
    /// nothing was executed or reported
    Rejected(Job),
}

impl JobOutcome {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn result(&self) -> Option<&JobResult> {
        match self {
            Self::Finished(result) => Some(result),
            Self::Canceled(_) | Self::Rejected(_) => None,
        }
    }
}

/// Control flow for running jobs of any registered type
///
/// Cheap to clone; runners share only the tracker and collaborators.
#[derive(Clone)]
pub struct JobRunner {
    tracker: JobLifecycleTracker,
    registry: Arc<JobTypeRegistry>,
    classifier: Arc<dyn ErrorClassifier>,
    work: Arc<dyn WorkFunction>,
    results: Arc<dyn ResultSink>,
    clock: Arc<dyn Clock>,
    strict_transitions: bool,
}

impl std::fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("work", &self.work.name())
            .field("classifier", &self.classifier.classifier_name())
            .field("strict_transitions", &self.strict_transitions)
            .finish_non_exhaustive()
    }
}

impl JobRunner {
    /// Runner with the standard classifier, the system clock and default
    /// transition strictness
    pub fn new(
        tracker: JobLifecycleTracker,
        registry: Arc<JobTypeRegistry>,
        work: Arc<dyn WorkFunction>,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            tracker,
            registry,
            classifier: Arc::new(StandardErrorClassifier::new()),
            work,
            results,
            clock: Arc::new(SystemClock),
            strict_transitions: RunnerConfig::default().strict_transitions,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: &RunnerConfig) -> Self {
        self.strict_transitions = config.strict_transitions;
        self
    }

    pub fn tracker(&self) -> &JobLifecycleTracker {
        &self.tracker
    }

    /// Create a pending job and record it. Unregistered type names are
    /// tracked as `unknown`.
    pub fn submit(&self, job_type: &str, args: Value) -> Job {
        let job_type = self.registry.resolve(job_type);
        let job = Job::new(job_type, args, self.clock.now());
        self.tracker.enqueue(&job.job_type);

        log_job_operation(
            "submit",
            Some(job.id),
            Some(job.job_type.as_str()),
            &job.state().to_string(),
            None,
        );
        job
    }

    /// Cancel a job that has not been handed to [`JobRunner::run`]
    pub fn cancel_pending(&self, job: &mut Job) -> Result<()> {
        self.cancel(job, "canceled before dispatch")?;
        Ok(())
    }

    /// Dispatch a pending job: dequeue, execute once, then record the
    /// cancellation or the classified outcome.
    #[instrument(skip_all, fields(job_id = %job.id, job_type = %job.job_type))]
    pub async fn run(&self, mut job: Job, cancel: &CancellationToken) -> Result<JobOutcome> {
        if cancel.is_cancelled() {
            debug!("Cancellation requested before dispatch");
            return Ok(if self.cancel(&mut job, "canceled before dispatch")? {
                JobOutcome::Canceled(job)
            } else {
                JobOutcome::Rejected(job)
            });
        }

        if !self.apply(&mut job, JobEvent::Dequeue)? {
            return Ok(JobOutcome::Rejected(job));
        }
        self.tracker
            .dequeue(&job.job_type, job.pending_since(), job.started_at());
        log_job_operation(
            "dequeue",
            Some(job.id),
            Some(job.job_type.as_str()),
            &job.state().to_string(),
            None,
        );

        debug!(work = self.work.name(), "Executing work function");
        let execution = self.work.execute(&job).await;

        if cancel.is_cancelled() {
            if execution.is_ok() {
                debug!("Discarding work payload of canceled job");
            }
            self.cancel(&mut job, "canceled while running")?;
            return Ok(JobOutcome::Canceled(job));
        }

        let recorded = self.apply(&mut job, JobEvent::Finish)?;
        let result = self.build_result(&job, execution, job.finished_at());

        if recorded {
            self.tracker.finish(
                &job.job_type,
                job.started_at(),
                job.finished_at(),
                job.is_canceled(),
                &result.status,
            );
        }

        log_job_operation(
            "finish",
            Some(job.id),
            Some(job.job_type.as_str()),
            result.status.as_label(),
            result
                .job_error
                .as_ref()
                .and_then(|error| error.details.as_deref()),
        );

        self.report(&result).await?;
        Ok(JobOutcome::Finished(result))
    }

    /// [`JobRunner::run`] with a token taken from `cancellations` for the
    /// duration of the run
    pub async fn run_registered(
        &self,
        job: Job,
        cancellations: &CancellationRegistry,
    ) -> Result<JobOutcome> {
        let job_id = job.id;
        let token = cancellations.register(job_id);
        let outcome = self.run(job, &token).await;
        cancellations.remove(job_id);
        outcome
    }

    /// Apply Cancel and release the job's gauge. `Ok(false)` if tolerated as illegal.
    fn cancel(&self, job: &mut Job, details: &str) -> Result<bool> {
        if !self.apply(job, JobEvent::Cancel)? {
            return Ok(false);
        }
        self.tracker.cancel(&job.job_type, job.started_at());
        log_job_operation(
            "cancel",
            Some(job.id),
            Some(job.job_type.as_str()),
            &job.state().to_string(),
            Some(details),
        );
        Ok(true)
    }

    fn build_result(
        &self,
        job: &Job,
        execution: anyhow::Result<Value>,
        finished_at: Option<DateTime<Utc>>,
    ) -> JobResult {
        match execution {
            Ok(payload) => JobResult::success(
                job.id,
                job.job_type.clone(),
                payload,
                job.started_at(),
                finished_at,
            ),
            Err(error) => {
                let kind = self.classifier.classify(&error);
                warn!(
                    error_kind = %kind,
                    error_code = kind.code(),
                    retryable = kind.is_retryable(),
                    error = %format!("{error:#}"),
                    "Job failed"
                );
                JobResult::failure(
                    job.id,
                    job.job_type.clone(),
                    JobError::new(kind, Some(format!("{error:#}"))),
                    job.started_at(),
                    finished_at,
                )
            }
        }
    }

    async fn report(&self, result: &JobResult) -> Result<()> {
        match self.results.report(result.job_id, result).await {
            Ok(()) => {
                info!(status = %result.status, "Job result reported");
                Ok(())
            }
            Err(source) => {
                log_error(
                    "job_runner",
                    "report",
                    &format!("{source:#}"),
                    Some(&format!("job_id={} status={}", result.job_id, result.status)),
                );
                Err(JobTrackerError::ResultReport {
                    job_id: result.job_id,
                    source,
                })
            }
        }
    }

    /// Apply `event` to the job's state tag, stamping the clock where the
    /// event carries a timestamp. `Ok(false)` means the transition was
    /// illegal and tolerated; the tracker must not be called.
    fn apply(&self, job: &mut Job, event: JobEvent) -> Result<bool> {
        let applied = match event {
            JobEvent::Dequeue => job.mark_dequeued(self.clock.now()),
            JobEvent::Cancel => job.mark_canceled(),
            JobEvent::Finish => job.mark_finished(self.clock.now()),
        };

        match applied {
            Ok(()) => Ok(true),
            Err(error) if self.strict_transitions => Err(error),
            Err(error) => {
                log_error(
                    "job_runner",
                    event.event_type(),
                    &error.to_string(),
                    Some("transition skipped, tracker not updated"),
                );
                Ok(false)
            }
        }
    }
}
