//! # Job Failure Classification
//!
//! Maps an arbitrary work-function failure onto exactly one [`ErrorKind`].
//!
//! ## Overview
//!
//! Work functions fail with `anyhow::Error`, which may wrap a typed
//! [`WorkFailure`], an I/O error from a transport, a tokio timeout, or plain
//! text. A typed [`WorkFailure`] anywhere in the error (including context
//! layers) decides the kind; otherwise the cause chain is walked and the first
//! recognised cause decides. Nothing recognised means [`ErrorKind::Unknown`].
//!
//! Classification is total: it never fails, never panics, and has no side
//! effects beyond trace logging, so the same failure always yields the same
//! kind.
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ anyhow::Error   │────▶│ ErrorClassifier │────▶│ ErrorKind       │
//! │ (cause chain)   │     │ (first match)   │     │ (Unknown if no  │
//! └─────────────────┘     └─────────────────┘     │  cause matches) │
//!                                                 └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use job_tracker::taxonomy::{ErrorClassifier, ErrorKind, StandardErrorClassifier, WorkFailure};
//!
//! let classifier = StandardErrorClassifier::new();
//!
//! let error = anyhow::Error::new(WorkFailure::MissingConfiguration {
//!     what: "Koji server".to_string(),
//!     name: "koji.example.com".to_string(),
//! })
//! .context("koji-init failed");
//!
//! assert_eq!(classifier.classify(&error), ErrorKind::ConfigurationMissing);
//! assert_eq!(classifier.classify(&anyhow::anyhow!("???")), ErrorKind::Unknown);
//! ```

use std::error::Error as StdError;
use std::io;
use tracing::trace;

use super::failure::WorkFailure;
use super::kinds::ErrorKind;

/// Trait for failure classification strategies
pub trait ErrorClassifier: Send + Sync {
    /// Classify a raw failure. Must be total and deterministic.
    fn classify(&self, error: &anyhow::Error) -> ErrorKind;

    /// Get the classifier name for identification
    fn classifier_name(&self) -> &'static str;
}

/// Standard classifier recognising typed work failures, I/O errors,
/// tokio timeouts and argument decoding errors
#[derive(Debug, Clone, Default)]
pub struct StandardErrorClassifier;

impl StandardErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a single cause, `None` if it is not recognised
    fn classify_cause(&self, cause: &(dyn StdError + 'static)) -> Option<ErrorKind> {
        if let Some(failure) = cause.downcast_ref::<WorkFailure>() {
            return Some(failure.kind());
        }

        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Self::classify_io_error(io_error);
        }

        if cause.is::<tokio::time::error::Elapsed>() {
            return Some(ErrorKind::Timeout);
        }

        if cause.is::<serde_json::Error>() {
            return Some(ErrorKind::InvalidJobArgs);
        }

        None
    }

    fn classify_io_error(error: &io::Error) -> Option<ErrorKind> {
        match error.kind() {
            io::ErrorKind::TimedOut => Some(ErrorKind::Timeout),
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe => Some(ErrorKind::RemoteServiceConnection),
            _ => None,
        }
    }
}

impl ErrorClassifier for StandardErrorClassifier {
    fn classify(&self, error: &anyhow::Error) -> ErrorKind {
        // Context layers are only reachable through anyhow's own downcast
        let kind = error
            .downcast_ref::<WorkFailure>()
            .map(WorkFailure::kind)
            .or_else(|| error.chain().find_map(|cause| self.classify_cause(cause)))
            .unwrap_or(ErrorKind::Unknown);

        trace!(kind = %kind, error = %error, "Classified job failure");
        kind
    }

    fn classifier_name(&self) -> &'static str {
        "StandardErrorClassifier"
    }
}
