//! Many runners sharing one tracker must converge to the same aggregates
//! regardless of interleaving.

mod common;

use std::sync::Arc;

use common::*;
use futures::future::join_all;
use job_tracker::metrics::GaugeSnapshot;
use job_tracker::models::OutcomeStatus;
use job_tracker::registry::{JobTypeRegistry, BUILTIN_JOB_TYPES};
use job_tracker::runner::{CancellationRegistry, JobRunner};
use job_tracker::taxonomy::ErrorKind;
use job_tracker::tracker::JobLifecycleTracker;
use serde_json::json;
use tokio_util::sync::CancellationToken;

const JOBS_PER_TYPE: usize = 50;

fn shared_runner() -> (JobRunner, Arc<RecordingSink>, Arc<ScriptedWork>) {
    let results = Arc::new(RecordingSink::default());
    let work = Arc::new(ScriptedWork::new(None));
    let runner = JobRunner::new(
        JobLifecycleTracker::new(fresh_sink()),
        Arc::new(JobTypeRegistry::new()),
        work.clone(),
        results.clone(),
    );
    (runner, results, work)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_converge() {
    let (runner, results, work) = shared_runner();
    let registry = JobTypeRegistry::new();

    let mut handles = Vec::new();
    for job_type in BUILTIN_JOB_TYPES {
        for index in 0..JOBS_PER_TYPE {
            let runner = runner.clone();
            handles.push(tokio::spawn(async move {
                // Every third job fails with a timeout
                let args = if index % 3 == 0 {
                    json!({"fail": "timeout"})
                } else {
                    json!({})
                };
                let job = runner.submit(job_type, args);
                tokio::task::yield_now().await;
                runner.run(job, &CancellationToken::new()).await
            }));
        }
    }

    for outcome in join_all(handles).await {
        outcome.unwrap().unwrap();
    }

    let failures = (0..JOBS_PER_TYPE).filter(|i| i % 3 == 0).count() as u64;
    let sink = runner.tracker().sink();
    for name in BUILTIN_JOB_TYPES {
        let job_type = registry.resolve(name);
        assert_eq!(sink.gauges(&job_type), GaugeSnapshot::default(), "{name}");
        assert_eq!(
            sink.total_jobs(&job_type, &OutcomeStatus::Failure(ErrorKind::Timeout)),
            failures
        );
        assert_eq!(
            sink.total_jobs(&job_type, &OutcomeStatus::Success),
            JOBS_PER_TYPE as u64 - failures
        );
        assert_eq!(
            sink.wait_histogram(&job_type).sample_count,
            JOBS_PER_TYPE as u64
        );
    }

    let total = BUILTIN_JOB_TYPES.len() * JOBS_PER_TYPE;
    assert_eq!(results.total_reports(), total);
    assert_eq!(work.total_calls(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancellations_keep_gauges_consistent() {
    let (runner, results, _work) = shared_runner();
    let cancellations = CancellationRegistry::new();
    let job_type = JobTypeRegistry::new().resolve("osbuild");

    let jobs: Vec<_> = (0..200)
        .map(|_| runner.submit("osbuild", json!({})))
        .collect();
    assert_eq!(runner.tracker().sink().pending(&job_type), 200);

    // Cancel every other job before it is dispatched
    for job in jobs.iter().step_by(2) {
        cancellations.register(job.id);
        cancellations.cancel(job.id);
    }

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let runner = runner.clone();
            let cancellations = cancellations.clone();
            tokio::spawn(async move { runner.run_registered(job, &cancellations).await })
        })
        .collect();

    let mut canceled = 0;
    for outcome in join_all(handles).await {
        if outcome.unwrap().unwrap().is_canceled() {
            canceled += 1;
        }
    }

    assert_eq!(canceled, 100);
    assert_eq!(results.total_reports(), 100);
    assert!(cancellations.is_empty());

    let sink = runner.tracker().sink();
    assert_eq!(sink.gauges(&job_type), GaugeSnapshot::default());
    assert_eq!(sink.total_jobs(&job_type, &OutcomeStatus::Success), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_raw_tracker_calls_from_many_tasks() {
    let tracker = JobLifecycleTracker::new(fresh_sink());
    let job_type = JobTypeRegistry::new().resolve("depsolve");

    let handles: Vec<_> = (0..500i64)
        .map(|i| {
            let tracker = tracker.clone();
            let job_type = job_type.clone();
            tokio::spawn(async move {
                tracker.enqueue(&job_type);
                tokio::task::yield_now().await;
                tracker.dequeue(&job_type, Some(at(0)), Some(at(i % 7)));
                tokio::task::yield_now().await;
                if i % 5 == 0 {
                    tracker.cancel(&job_type, Some(at(i % 7)));
                } else {
                    tracker.finish(
                        &job_type,
                        Some(at(i % 7)),
                        Some(at(i % 7 + 1)),
                        false,
                        &OutcomeStatus::Success,
                    );
                }
            })
        })
        .collect();

    for handle in join_all(handles).await {
        handle.unwrap();
    }

    let sink = tracker.sink();
    assert_eq!(sink.gauges(&job_type), GaugeSnapshot::default());
    assert_eq!(sink.total_jobs(&job_type, &OutcomeStatus::Success), 400);
    assert_eq!(
        sink.run_histogram(&job_type, &OutcomeStatus::Success)
            .sample_sum,
        400.0
    );
    assert_eq!(sink.wait_histogram(&job_type).sample_count, 500);
}
