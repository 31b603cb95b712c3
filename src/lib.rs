#![allow(clippy::doc_markdown)] // Allow technical terms like Prometheus, Koji in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Job Tracker Core
//!
//! Worker-side job lifecycle tracking and failure classification.
//!
//! ## Overview
//!
//! A worker pulls jobs (image builds, depsolves, Koji imports, cloud uploads)
//! and runs them against remote services. This crate follows each job from
//! submission to completion, records how long it waited and ran, and turns
//! whatever went wrong into a stable, machine-readable error kind that
//! dashboards and the dispatch layer can act on.
//!
//! ## Architecture
//!
//! ```text
//! JobRunner ──▶ JobLifecycleTracker ──▶ MetricsSink ◀── scrape / render()
//!     │
//!     ├──▶ WorkFunction   (remote action, never retried)
//!     ├──▶ ErrorClassifier (anyhow::Error -> ErrorKind)
//!     └──▶ ResultSink     (finished JobResult, exactly once)
//! ```
//!
//! ## Module Organization
//!
//! - [`taxonomy`] - Error kinds and failure classification
//! - [`state_machine`] - Per-job state tag and legal transitions
//! - [`models`] - Job and job result records
//! - [`registry`] - Known job types bounding metric labels
//! - [`metrics`] - Prometheus-backed aggregation
//! - [`tracker`] - State transitions to metric observations
//! - [`runner`] - Control flow for a single job
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Infrastructure errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use job_tracker::config::TrackerConfig;
//! use job_tracker::metrics::MetricsSink;
//! use job_tracker::runner::{JobRunner, ResultSink, WorkFunction};
//! use job_tracker::tracker::JobLifecycleTracker;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(
//! #     work: Arc<dyn WorkFunction>,
//! #     results: Arc<dyn ResultSink>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! job_tracker::logging::init_structured_logging();
//!
//! let config = TrackerConfig::load(None)?;
//! let sink = Arc::new(MetricsSink::new(&config.metrics)?);
//! let runner = JobRunner::new(
//!     JobLifecycleTracker::new(sink.clone()),
//!     Arc::new(config.job_type_registry()),
//!     work,
//!     results,
//! )
//! .with_config(&config.runner);
//!
//! let job = runner.submit("depsolve", serde_json::json!({"packages": ["kernel"]}));
//! let outcome = runner.run(job, &CancellationToken::new()).await?;
//!
//! println!("{}", sink.render()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod runner;
pub mod state_machine;
pub mod taxonomy;
pub mod tracker;

pub use config::{ConfigurationError, TrackerConfig};
pub use error::{JobTrackerError, Result};
pub use metrics::{MetricsConfig, MetricsSink};
pub use models::{Job, JobError, JobResult, OutcomeStatus};
pub use registry::{JobType, JobTypeRegistry};
pub use runner::{JobOutcome, JobRunner};
pub use state_machine::{JobEvent, JobState};
pub use taxonomy::{ErrorClassifier, ErrorKind, StandardErrorClassifier, WorkFailure};
pub use tracker::JobLifecycleTracker;
