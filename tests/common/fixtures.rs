use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use job_tracker::config::RunnerConfig;
use job_tracker::metrics::{MetricsConfig, MetricsSink};
use job_tracker::models::{Job, JobResult};
use job_tracker::registry::JobTypeRegistry;
use job_tracker::runner::{JobRunner, ManualClock, ResultSink, WorkFunction};
use job_tracker::taxonomy::{ErrorKind, WorkFailure};
use job_tracker::tracker::JobLifecycleTracker;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn fresh_sink() -> Arc<MetricsSink> {
    Arc::new(MetricsSink::new(&MetricsConfig::default()).unwrap())
}

/// Work function driven by the job's arguments:
///
/// - `seconds`: how far to advance the manual clock while "working"
/// - `fail`: an error kind name to fail with
/// - `io`: fail with an I/O error of this kind (`timed_out`, `connection_refused`)
pub struct ScriptedWork {
    clock: Option<Arc<ManualClock>>,
    calls: DashMap<Uuid, usize>,
}

impl ScriptedWork {
    pub fn new(clock: Option<Arc<ManualClock>>) -> Self {
        Self {
            clock,
            calls: DashMap::new(),
        }
    }

    pub fn calls(&self, job_id: Uuid) -> usize {
        self.calls.get(&job_id).map(|count| *count).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl WorkFunction for ScriptedWork {
    async fn execute(&self, job: &Job) -> anyhow::Result<Value> {
        *self.calls.entry(job.id).or_insert(0) += 1;

        if let (Some(clock), Some(seconds)) = (&self.clock, job.args["seconds"].as_f64()) {
            clock.advance(Duration::milliseconds((seconds * 1000.0) as i64));
        }

        if let Some(kind) = job.args["fail"].as_str() {
            let kind: ErrorKind = kind.parse().map_err(anyhow::Error::msg)?;
            return Err(WorkFailure::classified(kind, "scripted failure").into());
        }

        match job.args["io"].as_str() {
            Some("timed_out") => {
                return Err(anyhow::Error::new(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "upload stalled",
                ))
                .context("uploading image"))
            }
            Some("connection_refused") => {
                return Err(anyhow::Error::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "koji hub refused connection",
                ))
                .context("calling koji"))
            }
            Some(other) => anyhow::bail!("unrecognised scripted failure {other}"),
            None => {}
        }

        Ok(serde_json::json!({"job_id": job.id, "arch": "x86_64"}))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Result sink that keeps every report
#[derive(Default)]
pub struct RecordingSink {
    reports: DashMap<Uuid, Vec<JobResult>>,
}

impl RecordingSink {
    pub fn reports_for(&self, job_id: Uuid) -> Vec<JobResult> {
        self.reports
            .get(&job_id)
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn total_reports(&self) -> usize {
        self.reports.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn report(&self, job_id: Uuid, result: &JobResult) -> anyhow::Result<()> {
        self.reports.entry(job_id).or_default().push(result.clone());
        Ok(())
    }
}

/// Result sink whose backend is always down
pub struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    async fn report(&self, _job_id: Uuid, _result: &JobResult) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("result store unavailable"))
    }
}

/// Everything a runner test needs, sharing one sink and manual clock
pub struct Harness {
    pub runner: JobRunner,
    pub sink: Arc<MetricsSink>,
    pub clock: Arc<ManualClock>,
    pub work: Arc<ScriptedWork>,
    pub results: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_strict_transitions(true)
    }

    /// Illegal transitions are logged and skipped instead of returned
    pub fn lenient() -> Self {
        Self::with_strict_transitions(false)
    }

    fn with_strict_transitions(strict_transitions: bool) -> Self {
        let clock = Arc::new(ManualClock::new(at(0)));
        let sink = fresh_sink();
        let work = Arc::new(ScriptedWork::new(Some(clock.clone())));
        let results = Arc::new(RecordingSink::default());
        let runner = JobRunner::new(
            JobLifecycleTracker::new(sink.clone()),
            Arc::new(JobTypeRegistry::new()),
            work.clone(),
            results.clone(),
        )
        .with_clock(clock.clone())
        .with_config(&RunnerConfig { strict_transitions });

        Self {
            runner,
            sink,
            clock,
            work,
            results,
        }
    }

    /// Same collaborators, results go to a sink that always fails
    pub fn with_failing_results(self) -> JobRunner {
        JobRunner::new(
            self.runner.tracker().clone(),
            Arc::new(JobTypeRegistry::new()),
            self.work.clone(),
            Arc::new(FailingSink),
        )
        .with_clock(self.clock.clone())
    }
}
