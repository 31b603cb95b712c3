//! End-to-end runs through the runner, tracker and metrics sink.

mod common;

use chrono::Duration;
use common::*;
use job_tracker::error::JobTrackerError;
use job_tracker::metrics::GaugeSnapshot;
use job_tracker::models::OutcomeStatus;
use job_tracker::runner::{CancellationRegistry, JobOutcome};
use job_tracker::state_machine::JobState;
use job_tracker::taxonomy::ErrorKind;
use serde_json::json;
use std::error::Error as _;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_job_flows_from_submission_to_report() {
    let h = Harness::new();
    let job = h.runner.submit("osbuild", json!({"seconds": 12.5}));
    let job_id = job.id;
    let job_type = job.job_type.clone();
    assert_eq!(h.sink.pending(&job_type), 1);

    h.clock.advance(Duration::seconds(42));
    let outcome = h.runner.run(job, &CancellationToken::new()).await.unwrap();

    let result = outcome.result().unwrap().clone();
    assert_eq!(result.status, OutcomeStatus::Success);
    assert_eq!(result.payload.as_ref().unwrap()["arch"], "x86_64");
    assert_eq!(result.started_at, Some(at(42)));
    assert_eq!(
        result.run_duration(),
        Some(Duration::milliseconds(12_500))
    );

    assert_eq!(h.work.calls(job_id), 1);
    assert_eq!(h.results.reports_for(job_id).len(), 1);

    assert_eq!(h.sink.gauges(&job_type), GaugeSnapshot::default());
    assert_eq!(h.sink.wait_histogram(&job_type).sample_sum, 42.0);
    assert_eq!(
        h.sink
            .run_histogram(&job_type, &OutcomeStatus::Success)
            .sample_sum,
        12.5
    );
    assert_eq!(h.sink.total_jobs(&job_type, &OutcomeStatus::Success), 1);
}

#[tokio::test]
async fn test_typed_failure_is_reported_with_its_kind() {
    let h = Harness::new();
    let job = h
        .runner
        .submit("koji-init", json!({"fail": "koji_init", "seconds": 3}));
    let job_id = job.id;
    let job_type = job.job_type.clone();

    let outcome = h.runner.run(job, &CancellationToken::new()).await.unwrap();

    let failed = OutcomeStatus::Failure(ErrorKind::KojiInit);
    let result = outcome.result().unwrap();
    assert_eq!(result.status, failed);
    assert!(result.payload.is_none());
    let error = result.job_error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::KojiInit);
    assert!(!error.retryable);

    assert_eq!(h.work.calls(job_id), 1);
    assert_eq!(h.sink.total_jobs(&job_type, &failed), 1);
    assert_eq!(h.sink.run_histogram(&job_type, &failed).sample_sum, 3.0);
    assert_eq!(h.sink.total_jobs(&job_type, &OutcomeStatus::Success), 0);
}

#[tokio::test]
async fn test_transport_failures_are_classified_and_not_retried() {
    let h = Harness::new();
    let timed_out = h.runner.submit("aws-ec2-copy", json!({"io": "timed_out"}));
    let refused = h
        .runner
        .submit("koji-finalize", json!({"io": "connection_refused"}));
    let (timed_out_id, refused_id) = (timed_out.id, refused.id);

    let token = CancellationToken::new();
    let first = h.runner.run(timed_out, &token).await.unwrap();
    let second = h.runner.run(refused, &token).await.unwrap();

    assert_eq!(
        first.result().unwrap().status,
        OutcomeStatus::Failure(ErrorKind::Timeout)
    );
    assert_eq!(
        second.result().unwrap().status,
        OutcomeStatus::Failure(ErrorKind::RemoteServiceConnection)
    );
    assert!(first.result().unwrap().job_error.as_ref().unwrap().retryable);

    // Retryable or not, the work function ran exactly once
    assert_eq!(h.work.calls(timed_out_id), 1);
    assert_eq!(h.work.calls(refused_id), 1);
}

#[tokio::test]
async fn test_unrecognised_failure_is_unknown() {
    let h = Harness::new();
    let job = h.runner.submit("depsolve", json!({"io": "cosmic_ray"}));
    let job_type = job.job_type.clone();

    let outcome = h.runner.run(job, &CancellationToken::new()).await.unwrap();

    let unknown = OutcomeStatus::Failure(ErrorKind::Unknown);
    assert_eq!(outcome.result().unwrap().status, unknown);
    assert_eq!(h.sink.total_jobs(&job_type, &unknown), 1);
}

#[tokio::test]
async fn test_report_failure_is_a_hard_error() {
    let h = Harness::new();
    let sink = h.sink.clone();
    let runner = h.with_failing_results();
    let job = runner.submit("osbuild", json!({}));
    let job_id = job.id;
    let job_type = job.job_type.clone();

    let error = runner
        .run(job, &CancellationToken::new())
        .await
        .unwrap_err();

    match &error {
        JobTrackerError::ResultReport { job_id: failed, .. } => assert_eq!(*failed, job_id),
        other => panic!("expected report failure, got {other:?}"),
    }
    assert!(error
        .source()
        .unwrap()
        .to_string()
        .contains("result store unavailable"));

    // The outcome was still recorded before reporting
    assert_eq!(sink.total_jobs(&job_type, &OutcomeStatus::Success), 1);
    assert_eq!(sink.running(&job_type), 0);
}

#[tokio::test]
async fn test_cancel_pending_job_releases_pending_gauge() {
    let h = Harness::new();
    let mut job = h.runner.submit("container-resolve", json!({}));
    let job_type = job.job_type.clone();

    h.runner.cancel_pending(&mut job).unwrap();

    assert_eq!(job.state(), JobState::Canceled);
    assert!(job.is_canceled());
    assert_eq!(h.sink.gauges(&job_type), GaugeSnapshot::default());
    assert_eq!(h.work.total_calls(), 0);
    assert_eq!(h.results.total_reports(), 0);
}

#[tokio::test]
async fn test_registered_job_can_be_canceled_by_id() {
    let h = Harness::new();
    let cancellations = CancellationRegistry::new();
    let job = h.runner.submit("ostree-resolve", json!({}));
    let job_id = job.id;
    let job_type = job.job_type.clone();

    cancellations.register(job_id);
    assert!(cancellations.cancel(job_id));

    let outcome = h
        .runner
        .run_registered(job, &cancellations)
        .await
        .unwrap();

    assert!(matches!(outcome, JobOutcome::Canceled(_)));
    assert!(!cancellations.is_registered(job_id));
    assert_eq!(h.sink.gauges(&job_type), GaugeSnapshot::default());
    assert_eq!(h.results.total_reports(), 0);
}

#[tokio::test]
async fn test_unregistered_job_type_is_tracked_as_unknown() {
    let h = Harness::new();
    let job = h.runner.submit("definitely-not-a-job-type", json!({}));
    let job_type = job.job_type.clone();

    h.runner.run(job, &CancellationToken::new()).await.unwrap();

    assert!(job_type.is_unknown());
    assert_eq!(h.sink.total_jobs(&job_type, &OutcomeStatus::Success), 1);
    let exposition = h.sink.render().unwrap();
    assert!(exposition.contains("type=\"unknown\""));
    assert!(!exposition.contains("definitely-not-a-job-type"));
}

#[tokio::test]
async fn test_dispatching_a_running_job_twice_is_rejected() {
    let h = Harness::new();
    let job = h.runner.submit("osbuild", json!({}));
    let mut copy = job.clone();
    copy.mark_dequeued(at(1)).unwrap();

    let error = h
        .runner
        .run(copy, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        JobTrackerError::InvalidTransition {
            from: JobState::Running,
            ..
        }
    ));
    assert_eq!(h.work.total_calls(), 0);
}

#[tokio::test]
async fn test_lenient_runner_does_not_run_canceled_job() {
    let h = Harness::lenient();
    let mut job = h.runner.submit("osbuild", json!({"seconds": 5}));
    let job_type = job.job_type.clone();
    h.runner.cancel_pending(&mut job).unwrap();

    let outcome = h.runner.run(job, &CancellationToken::new()).await.unwrap();

    assert!(outcome.is_rejected());
    assert!(!outcome.is_canceled());
    assert!(outcome.result().is_none());
    assert_eq!(h.work.total_calls(), 0);
    assert_eq!(h.results.total_reports(), 0);
    assert_eq!(h.sink.gauges(&job_type), GaugeSnapshot::default());
    assert_eq!(h.sink.total_jobs(&job_type, &OutcomeStatus::Success), 0);
}

#[tokio::test]
async fn test_lenient_runner_runs_a_duplicated_job_once() {
    let h = Harness::lenient();
    let job = h.runner.submit("osbuild", json!({"seconds": 5}));
    let job_id = job.id;
    let job_type = job.job_type.clone();
    let mut duplicate = job.clone();
    duplicate.mark_dequeued(at(1)).unwrap();

    let first = h.runner.run(job, &CancellationToken::new()).await.unwrap();
    let second = h
        .runner
        .run(duplicate, &CancellationToken::new())
        .await
        .unwrap();

    assert!(first.result().is_some());
    match second {
        JobOutcome::Rejected(job) => assert_eq!(job.state(), JobState::Running),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(h.work.calls(job_id), 1);
    assert_eq!(h.results.reports_for(job_id).len(), 1);
    assert_eq!(h.sink.total_jobs(&job_type, &OutcomeStatus::Success), 1);
    assert_eq!(h.sink.gauges(&job_type), GaugeSnapshot::default());
}
