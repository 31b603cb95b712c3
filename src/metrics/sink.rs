//! Prometheus-backed aggregation surface for job lifecycle observations.
//!
//! Each sink owns its own [`Registry`]; production builds one at the
//! composition root and shares it through `Arc`, tests build a fresh one per
//! test. Accumulation never fails: gauges refuse to go below zero and
//! malformed durations are coerced to zero, both with a warning.

use parking_lot::Mutex;
use prometheus::{
    proto::MetricFamily, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use serde::Serialize;
use tracing::{debug, warn};

use super::MetricsConfig;
use crate::error::{JobTrackerError, Result};
use crate::models::OutcomeStatus;
use crate::registry::JobType;

const TYPE_LABEL: &str = "type";
const STATUS_LABEL: &str = "status";
const REASON_LABEL: &str = "reason";

/// Why a lifecycle observation was not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Dequeue without a pending or start timestamp
    DequeueMissingTimestamp,
    /// Finish without a start or finish timestamp
    FinishMissingTimestamp,
    /// Finish reported for a job that was canceled
    FinishAfterCancel,
    /// Pending gauge decrement at zero
    PendingUnderflow,
    /// Running gauge decrement at zero
    RunningUnderflow,
}

impl SkipReason {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::DequeueMissingTimestamp => "dequeue_missing_timestamp",
            Self::FinishMissingTimestamp => "finish_missing_timestamp",
            Self::FinishAfterCancel => "finish_after_cancel",
            Self::PendingUnderflow => "pending_underflow",
            Self::RunningUnderflow => "running_underflow",
        }
    }
}

/// Point-in-time view of the live gauges for one job type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GaugeSnapshot {
    pub pending: i64,
    pub running: i64,
}

/// Aggregate state of one histogram series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HistogramSnapshot {
    pub sample_count: u64,
    pub sample_sum: f64,
}

/// Concurrency-safe counters, gauges and histograms keyed by job type and outcome
pub struct MetricsSink {
    registry: Registry,
    total_jobs: IntCounterVec,
    pending_jobs: IntGaugeVec,
    running_jobs: IntGaugeVec,
    job_duration: HistogramVec,
    job_wait_duration: HistogramVec,
    skipped_observations: IntCounterVec,
    // Serialises every gauge mutation and compound transition so the floor
    // check and the grouped updates of one transition are atomic
    transitions: Mutex<()>,
}

impl std::fmt::Debug for MetricsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSink").finish_non_exhaustive()
    }
}

impl MetricsSink {
    /// Create a sink with its own registry. Fails only on invalid configuration.
    pub fn new(config: &MetricsConfig) -> Result<Self> {
        config.validate()?;

        let opts = |name: &str, help: &str| {
            Opts::new(name, help)
                .namespace(config.namespace.clone())
                .subsystem(config.subsystem.clone())
        };
        let histogram_opts = |name: &str, help: &str| {
            HistogramOpts::new(name, help)
                .namespace(config.namespace.clone())
                .subsystem(config.subsystem.clone())
                .buckets(config.duration_buckets.clone())
        };

        let total_jobs =
            IntCounterVec::new(opts("total_jobs", "Total jobs"), &[TYPE_LABEL, STATUS_LABEL])?;
        let pending_jobs =
            IntGaugeVec::new(opts("pending_jobs", "Currently pending jobs"), &[TYPE_LABEL])?;
        let running_jobs =
            IntGaugeVec::new(opts("running_jobs", "Currently running jobs"), &[TYPE_LABEL])?;
        let job_duration = HistogramVec::new(
            histogram_opts(
                "job_duration_seconds",
                "Duration spent by workers on a job.",
            ),
            &[TYPE_LABEL, STATUS_LABEL],
        )?;
        let job_wait_duration = HistogramVec::new(
            histogram_opts(
                "job_wait_duration_seconds",
                "Duration a job spends on the queue.",
            ),
            &[TYPE_LABEL],
        )?;
        let skipped_observations = IntCounterVec::new(
            opts(
                "skipped_observations_total",
                "Job lifecycle observations that were not recorded",
            ),
            &[TYPE_LABEL, REASON_LABEL],
        )?;

        let registry = Registry::new();
        registry.register(Box::new(total_jobs.clone()))?;
        registry.register(Box::new(pending_jobs.clone()))?;
        registry.register(Box::new(running_jobs.clone()))?;
        registry.register(Box::new(job_duration.clone()))?;
        registry.register(Box::new(job_wait_duration.clone()))?;
        registry.register(Box::new(skipped_observations.clone()))?;

        debug!(
            namespace = %config.namespace,
            subsystem = %config.subsystem,
            buckets = config.duration_buckets.len(),
            "Job metrics sink initialized"
        );

        Ok(Self {
            registry,
            total_jobs,
            pending_jobs,
            running_jobs,
            job_duration,
            job_wait_duration,
            skipped_observations,
            transitions: Mutex::new(()),
        })
    }

    // Primitive accumulation

    pub fn increment_pending(&self, job_type: &JobType) {
        let _guard = self.transitions.lock();
        self.pending_jobs
            .with_label_values(&[job_type.as_str()])
            .inc();
    }

    pub fn decrement_pending(&self, job_type: &JobType) {
        let _guard = self.transitions.lock();
        self.decrement_pending_locked(job_type);
    }

    pub fn increment_running(&self, job_type: &JobType) {
        let _guard = self.transitions.lock();
        self.running_jobs
            .with_label_values(&[job_type.as_str()])
            .inc();
    }

    pub fn decrement_running(&self, job_type: &JobType) {
        let _guard = self.transitions.lock();
        self.decrement_running_locked(job_type);
    }

    pub fn observe_wait(&self, job_type: &JobType, seconds: f64) {
        self.job_wait_duration
            .with_label_values(&[job_type.as_str()])
            .observe(sanitize_seconds(job_type, seconds));
    }

    pub fn observe_run(&self, job_type: &JobType, status: &OutcomeStatus, seconds: f64) {
        self.job_duration
            .with_label_values(&[job_type.as_str(), status.as_label()])
            .observe(sanitize_seconds(job_type, seconds));
    }

    pub fn increment_total(&self, job_type: &JobType, status: &OutcomeStatus) {
        self.total_jobs
            .with_label_values(&[job_type.as_str(), status.as_label()])
            .inc();
    }

    pub fn record_skipped(&self, job_type: &JobType, reason: SkipReason) {
        self.skipped_observations
            .with_label_values(&[job_type.as_str(), reason.as_label()])
            .inc();
    }

    // Compound transitions, each applied under one lock

    /// Pending -> Running: wait sample, pending down, running up
    pub fn record_dequeue(&self, job_type: &JobType, wait_seconds: f64) {
        let _guard = self.transitions.lock();
        self.observe_wait(job_type, wait_seconds);
        self.decrement_pending_locked(job_type);
        self.running_jobs
            .with_label_values(&[job_type.as_str()])
            .inc();
    }

    /// -> Canceled: release whichever gauge the job was counted in
    pub fn record_cancel(&self, job_type: &JobType, was_running: bool) {
        let _guard = self.transitions.lock();
        if was_running {
            self.decrement_running_locked(job_type);
        } else {
            self.decrement_pending_locked(job_type);
        }
    }

    /// Running -> Finished: run sample, total up, running down
    pub fn record_finish(&self, job_type: &JobType, status: &OutcomeStatus, run_seconds: f64) {
        let _guard = self.transitions.lock();
        self.observe_run(job_type, status, run_seconds);
        self.increment_total(job_type, status);
        self.decrement_running_locked(job_type);
    }

    // Read surface

    pub fn pending(&self, job_type: &JobType) -> i64 {
        self.pending_jobs
            .with_label_values(&[job_type.as_str()])
            .get()
    }

    pub fn running(&self, job_type: &JobType) -> i64 {
        self.running_jobs
            .with_label_values(&[job_type.as_str()])
            .get()
    }

    /// Both gauges read under the transition lock
    pub fn gauges(&self, job_type: &JobType) -> GaugeSnapshot {
        let _guard = self.transitions.lock();
        GaugeSnapshot {
            pending: self.pending(job_type),
            running: self.running(job_type),
        }
    }

    pub fn total_jobs(&self, job_type: &JobType, status: &OutcomeStatus) -> u64 {
        self.total_jobs
            .with_label_values(&[job_type.as_str(), status.as_label()])
            .get()
    }

    pub fn skipped(&self, job_type: &JobType, reason: SkipReason) -> u64 {
        self.skipped_observations
            .with_label_values(&[job_type.as_str(), reason.as_label()])
            .get()
    }

    pub fn wait_histogram(&self, job_type: &JobType) -> HistogramSnapshot {
        let histogram = self
            .job_wait_duration
            .with_label_values(&[job_type.as_str()]);
        HistogramSnapshot {
            sample_count: histogram.get_sample_count(),
            sample_sum: histogram.get_sample_sum(),
        }
    }

    pub fn run_histogram(&self, job_type: &JobType, status: &OutcomeStatus) -> HistogramSnapshot {
        let histogram = self
            .job_duration
            .with_label_values(&[job_type.as_str(), status.as_label()]);
        HistogramSnapshot {
            sample_count: histogram.get_sample_count(),
            sample_sum: histogram.get_sample_sum(),
        }
    }

    /// Collect all metric families for an external exporter
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| JobTrackerError::Metrics(e.to_string()))
    }

    fn decrement_pending_locked(&self, job_type: &JobType) {
        let gauge = self.pending_jobs.with_label_values(&[job_type.as_str()]);
        if gauge.get() > 0 {
            gauge.dec();
        } else {
            warn!(job_type = %job_type, "Pending job gauge already at zero, ignoring decrement");
            self.record_skipped(job_type, SkipReason::PendingUnderflow);
        }
    }

    fn decrement_running_locked(&self, job_type: &JobType) {
        let gauge = self.running_jobs.with_label_values(&[job_type.as_str()]);
        if gauge.get() > 0 {
            gauge.dec();
        } else {
            warn!(job_type = %job_type, "Running job gauge already at zero, ignoring decrement");
            self.record_skipped(job_type, SkipReason::RunningUnderflow);
        }
    }
}

/// Durations must be finite and non-negative; anything else is recorded as zero
fn sanitize_seconds(job_type: &JobType, seconds: f64) -> f64 {
    if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        warn!(job_type = %job_type, seconds, "Invalid job duration, recording zero");
        0.0
    }
}
