//! Typed failures raised by work functions.
//!
//! Work functions return `anyhow::Result`, so they can fail with anything.
//! Code that knows why it failed raises a [`WorkFailure`] (directly or wrapped
//! in context) and the classifier maps it onto the matching [`ErrorKind`].

use std::time::Duration;
use thiserror::Error;

use super::kinds::ErrorKind;

#[derive(Debug, Error)]
pub enum WorkFailure {
    #[error("Invalid job arguments: {0}")]
    InvalidArguments(String),

    #[error("{what} has not been configured: {name}")]
    MissingConfiguration { what: String, name: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Authentication with {service} failed: {reason}")]
    Authentication { service: String, reason: String },

    #[error("Unexpected response from {service}: {reason}")]
    Protocol { service: String, reason: String },

    #[error("Could not connect to {service}: {reason}")]
    Connection { service: String, reason: String },

    #[error("{service} is unavailable: {reason}")]
    Unavailable { service: String, reason: String },

    /// Explicitly classified failure for domain-specific kinds
    #[error("{reason}")]
    Classified { kind: ErrorKind, reason: String },
}

impl WorkFailure {
    pub fn classified(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self::Classified {
            kind,
            reason: reason.into(),
        }
    }

    /// The kind this failure names
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArguments(_) => ErrorKind::InvalidJobArgs,
            Self::MissingConfiguration { .. } => ErrorKind::ConfigurationMissing,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Authentication { .. } => ErrorKind::RemoteServiceAuth,
            Self::Protocol { .. } => ErrorKind::RemoteServiceProtocol,
            Self::Connection { .. } => ErrorKind::RemoteServiceConnection,
            Self::Unavailable { .. } => ErrorKind::RemoteServiceUnavailable,
            Self::Classified { kind, .. } => *kind,
        }
    }
}
