//! # Error Kinds
//!
//! The closed set of job failure kinds. Every kind carries a stable numeric
//! code and a stable snake_case name; both end up in persisted job results and
//! in metric labels, so a code is never reused or renumbered once assigned.
//! New kinds are appended with the next free code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Work domain a kind originates from, used by dashboards to group failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorDomain {
    /// Failures of the tracking core itself or unclassifiable failures
    Internal,
    /// Job argument and job graph problems detected by the worker
    Worker,
    /// Missing or invalid worker configuration
    Configuration,
    /// Authentication, protocol and availability problems talking to a remote service
    RemoteService,
    /// Package dependency resolution
    Depsolve,
    /// Manifest generation and image builds
    Build,
    /// Uploading, importing and sharing build artifacts
    Upload,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Worker => write!(f, "worker"),
            Self::Configuration => write!(f, "configuration"),
            Self::RemoteService => write!(f, "remote_service"),
            Self::Depsolve => write!(f, "depsolve"),
            Self::Build => write!(f, "build"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// Stable, enumerable category of job failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Reserved fallback for failures nothing else matches
    Unknown,
    InvalidJobArgs,
    MissingDynamicArgs,
    JobDependencyFailed,
    ConfigurationMissing,
    InvalidTargetConfig,
    RemoteServiceAuth,
    RemoteServiceProtocol,
    RemoteServiceConnection,
    RemoteServiceUnavailable,
    Timeout,
    KojiInit,
    KojiFinalize,
    KojiBuild,
    DepsolveFailed,
    DepsolveRepoUnavailable,
    ManifestGeneration,
    BuildFailed,
    UploadFailed,
    ImageImportFailed,
    TargetSharingFailed,
    ResultReadFailed,
}

impl ErrorKind {
    /// Every assigned kind, in code order
    pub const ALL: [ErrorKind; 22] = [
        Self::Unknown,
        Self::InvalidJobArgs,
        Self::MissingDynamicArgs,
        Self::JobDependencyFailed,
        Self::ConfigurationMissing,
        Self::InvalidTargetConfig,
        Self::RemoteServiceAuth,
        Self::RemoteServiceProtocol,
        Self::RemoteServiceConnection,
        Self::RemoteServiceUnavailable,
        Self::Timeout,
        Self::KojiInit,
        Self::KojiFinalize,
        Self::KojiBuild,
        Self::DepsolveFailed,
        Self::DepsolveRepoUnavailable,
        Self::ManifestGeneration,
        Self::BuildFailed,
        Self::UploadFailed,
        Self::ImageImportFailed,
        Self::TargetSharingFailed,
        Self::ResultReadFailed,
    ];

    /// Stable numeric code. Never change an existing arm.
    pub fn code(&self) -> u16 {
        match self {
            Self::Unknown => 0,
            Self::InvalidJobArgs => 1,
            Self::MissingDynamicArgs => 2,
            Self::JobDependencyFailed => 3,
            Self::ConfigurationMissing => 4,
            Self::InvalidTargetConfig => 5,
            Self::RemoteServiceAuth => 6,
            Self::RemoteServiceProtocol => 7,
            Self::RemoteServiceConnection => 8,
            Self::RemoteServiceUnavailable => 9,
            Self::Timeout => 10,
            Self::KojiInit => 11,
            Self::KojiFinalize => 12,
            Self::KojiBuild => 13,
            Self::DepsolveFailed => 14,
            Self::DepsolveRepoUnavailable => 15,
            Self::ManifestGeneration => 16,
            Self::BuildFailed => 17,
            Self::UploadFailed => 18,
            Self::ImageImportFailed => 19,
            Self::TargetSharingFailed => 20,
            Self::ResultReadFailed => 21,
        }
    }

    /// Stable string name, also used as the metrics `status` label
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::InvalidJobArgs => "invalid_job_args",
            Self::MissingDynamicArgs => "missing_dynamic_args",
            Self::JobDependencyFailed => "job_dependency_failed",
            Self::ConfigurationMissing => "configuration_missing",
            Self::InvalidTargetConfig => "invalid_target_config",
            Self::RemoteServiceAuth => "remote_service_auth",
            Self::RemoteServiceProtocol => "remote_service_protocol",
            Self::RemoteServiceConnection => "remote_service_connection",
            Self::RemoteServiceUnavailable => "remote_service_unavailable",
            Self::Timeout => "timeout",
            Self::KojiInit => "koji_init",
            Self::KojiFinalize => "koji_finalize",
            Self::KojiBuild => "koji_build",
            Self::DepsolveFailed => "depsolve_failed",
            Self::DepsolveRepoUnavailable => "depsolve_repo_unavailable",
            Self::ManifestGeneration => "manifest_generation",
            Self::BuildFailed => "build_failed",
            Self::UploadFailed => "upload_failed",
            Self::ImageImportFailed => "image_import_failed",
            Self::TargetSharingFailed => "target_sharing_failed",
            Self::ResultReadFailed => "result_read_failed",
        }
    }

    pub fn domain(&self) -> ErrorDomain {
        match self {
            Self::Unknown | Self::ResultReadFailed => ErrorDomain::Internal,
            Self::InvalidJobArgs
            | Self::MissingDynamicArgs
            | Self::JobDependencyFailed
            | Self::Timeout => ErrorDomain::Worker,
            Self::ConfigurationMissing | Self::InvalidTargetConfig => ErrorDomain::Configuration,
            Self::RemoteServiceAuth
            | Self::RemoteServiceProtocol
            | Self::RemoteServiceConnection
            | Self::RemoteServiceUnavailable
            | Self::KojiInit
            | Self::KojiFinalize
            | Self::KojiBuild => ErrorDomain::RemoteService,
            Self::DepsolveFailed | Self::DepsolveRepoUnavailable => ErrorDomain::Depsolve,
            Self::ManifestGeneration | Self::BuildFailed => ErrorDomain::Build,
            Self::UploadFailed | Self::ImageImportFailed | Self::TargetSharingFailed => {
                ErrorDomain::Upload
            }
        }
    }

    /// Whether the dispatch layer may resubmit a job that failed with this kind.
    ///
    /// The tracking core only records this flag; it never acts on it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteServiceConnection
                | Self::RemoteServiceUnavailable
                | Self::Timeout
                | Self::DepsolveRepoUnavailable
                | Self::UploadFailed
                | Self::ResultReadFailed
        )
    }

    /// Human-readable description of the kind
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown error",
            Self::InvalidJobArgs => "Job arguments could not be parsed",
            Self::MissingDynamicArgs => "Job is missing dynamic arguments from its dependencies",
            Self::JobDependencyFailed => "A job this job depends on failed",
            Self::ConfigurationMissing => "Required worker configuration is missing",
            Self::InvalidTargetConfig => "Upload target configuration is invalid",
            Self::RemoteServiceAuth => "Authentication with the remote service failed",
            Self::RemoteServiceProtocol => "The remote service returned an unexpected response",
            Self::RemoteServiceConnection => "Could not connect to the remote service",
            Self::RemoteServiceUnavailable => "The remote service is temporarily unavailable",
            Self::Timeout => "The operation timed out",
            Self::KojiInit => "Koji build initialization failed",
            Self::KojiFinalize => "Koji build finalization failed",
            Self::KojiBuild => "Koji build failed",
            Self::DepsolveFailed => "Package dependency resolution failed",
            Self::DepsolveRepoUnavailable => "A package repository could not be reached",
            Self::ManifestGeneration => "Manifest generation failed",
            Self::BuildFailed => "Image build failed",
            Self::UploadFailed => "Uploading the artifact failed",
            Self::ImageImportFailed => "Importing the image into the target failed",
            Self::TargetSharingFailed => "Sharing the artifact with the target accounts failed",
            Self::ResultReadFailed => "Reading a dependency's job result failed",
        }
    }

    /// Look a kind up by its stable code
    pub fn from_code(code: u16) -> Option<ErrorKind> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("Invalid error kind: {s}"))
    }
}
