//! # Runner Collaborator Traits
//!
//! The runner does no remote work and persists nothing itself. It drives two
//! collaborators supplied by the embedding worker:
//!
//! - [`WorkFunction`] performs the job's remote action and returns an opaque
//!   payload or a failure to be classified
//! - [`ResultSink`] persists or forwards the finished [`JobResult`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! struct DepsolveWork { client: DepsolveClient }
//!
//! #[async_trait]
//! impl WorkFunction for DepsolveWork {
//!     async fn execute(&self, job: &Job) -> anyhow::Result<serde_json::Value> {
//!         let request: DepsolveRequest = serde_json::from_value(job.args.clone())?;
//!         Ok(serde_json::to_value(self.client.depsolve(request).await?)?)
//!     }
//!
//!     fn name(&self) -> &str {
//!         "depsolve"
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Job, JobResult};

/// The remote action behind a job
///
/// Called at most once per job; the runner never retries. Failures may be
/// any error, a typed [`crate::taxonomy::WorkFailure`] gives the most precise
/// classification. Timeouts are the implementation's responsibility and
/// should surface as a failure like any other.
#[async_trait]
pub trait WorkFunction: Send + Sync + 'static {
    async fn execute(&self, job: &Job) -> anyhow::Result<Value>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Destination for finished job results
///
/// Called exactly once per finished job. An error means the outcome may be
/// lost and is surfaced to the runner's caller as a hard failure.
#[async_trait]
pub trait ResultSink: Send + Sync + 'static {
    async fn report(&self, job_id: Uuid, result: &JobResult) -> anyhow::Result<()>;
}
