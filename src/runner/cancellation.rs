//! Out-of-band cancellation handles keyed by job id.
//!
//! The dispatch layer registers a token per in-flight job and cancels it by
//! id when the queue tells it to. All tokens are children of one root, so
//! shutting the worker down cancels every job at once.
//!
//! ```rust
//! use job_tracker::runner::CancellationRegistry;
//! use uuid::Uuid;
//!
//! # tokio_test::block_on(async {
//! let cancellations = CancellationRegistry::new();
//! let job_id = Uuid::new_v4();
//! let token = cancellations.register(job_id);
//!
//! assert!(cancellations.cancel(job_id));
//! token.cancelled().await;
//! # });
//! ```

use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    root: CancellationToken,
    tokens: Arc<DashMap<Uuid, CancellationToken>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for `job_id`, created on first use
    pub fn register(&self, job_id: Uuid) -> CancellationToken {
        self.tokens
            .entry(job_id)
            .or_insert_with(|| self.root.child_token())
            .clone()
    }

    /// Cancel one job. Returns false if it is not registered.
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.tokens.get(&job_id) {
            Some(token) => {
                debug!(job_id = %job_id, "Cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered and future job
    pub fn cancel_all(&self) {
        debug!(in_flight = self.tokens.len(), "Cancelling all jobs");
        self.root.cancel();
    }

    pub fn remove(&self, job_id: Uuid) {
        self.tokens.remove(&job_id);
    }

    pub fn is_registered(&self, job_id: Uuid) -> bool {
        self.tokens.contains_key(&job_id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
