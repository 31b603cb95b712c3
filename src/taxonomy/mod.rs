//! # Error Taxonomy
//!
//! Stable, machine-readable classification of why a job's remote work failed.
//!
//! - [`kinds`] - the closed [`ErrorKind`] set with codes, names, domains and retryability
//! - [`failure`] - [`WorkFailure`], the typed failures work functions can raise
//! - [`classifier`] - total mapping from any `anyhow::Error` to an [`ErrorKind`]

pub mod classifier;
pub mod failure;
pub mod kinds;

pub use classifier::{ErrorClassifier, StandardErrorClassifier};
pub use failure::WorkFailure;
pub use kinds::{ErrorDomain, ErrorKind};
