//! # Job Type Registry
//!
//! Fixed set of job type tags the worker knows about. Job types become metric
//! labels, so a type that is not registered is coerced to [`JobType::unknown`]
//! instead of minting a new label series.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

pub const OSBUILD: &str = "osbuild";
pub const OSBUILD_KOJI: &str = "osbuild-koji";
pub const KOJI_INIT: &str = "koji-init";
pub const KOJI_FINALIZE: &str = "koji-finalize";
pub const DEPSOLVE: &str = "depsolve";
pub const MANIFEST_ID_ONLY: &str = "manifest-id-only";
pub const CONTAINER_RESOLVE: &str = "container-resolve";
pub const OSTREE_RESOLVE: &str = "ostree-resolve";
pub const FILE_RESOLVE: &str = "file-resolve";
pub const AWS_EC2_COPY: &str = "aws-ec2-copy";
pub const AWS_EC2_SHARE: &str = "aws-ec2-share";
pub const SEARCH_PACKAGES: &str = "search-packages";

/// Label used for job types outside the registry
pub const UNKNOWN_JOB_TYPE: &str = "unknown";

/// Job types every worker understands
pub const BUILTIN_JOB_TYPES: [&str; 12] = [
    OSBUILD,
    OSBUILD_KOJI,
    KOJI_INIT,
    KOJI_FINALIZE,
    DEPSOLVE,
    MANIFEST_ID_ONLY,
    CONTAINER_RESOLVE,
    OSTREE_RESOLVE,
    FILE_RESOLVE,
    AWS_EC2_COPY,
    AWS_EC2_SHARE,
    SEARCH_PACKAGES,
];

/// A job type tag that is guaranteed to be a registered label.
///
/// Only [`JobTypeRegistry::resolve`] and [`JobType::unknown`] construct one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobType(Arc<str>);

impl JobType {
    /// The catch-all type for unregistered tags
    pub fn unknown() -> Self {
        Self(Arc::from(UNKNOWN_JOB_TYPE))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.as_str() == UNKNOWN_JOB_TYPE
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for JobType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Immutable registry of known job types, shared through `Arc`
#[derive(Debug, Clone)]
pub struct JobTypeRegistry {
    known: BTreeSet<Arc<str>>,
}

impl JobTypeRegistry {
    /// Registry with the built-in job types only
    pub fn new() -> Self {
        Self::with_extra_types(std::iter::empty::<String>())
    }

    /// Registry with the built-in job types plus `extra`
    pub fn with_extra_types<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known: BTreeSet<Arc<str>> = BUILTIN_JOB_TYPES.iter().map(|t| Arc::from(*t)).collect();
        known.extend(
            extra
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| is_valid_job_type_name(t))
                .map(Arc::from),
        );
        Self { known }
    }

    /// Resolve a raw tag into a label-safe [`JobType`]
    pub fn resolve(&self, name: &str) -> JobType {
        match self.known.get(name) {
            Some(known) => JobType(Arc::clone(known)),
            None => {
                warn!(job_type = %name, "Unregistered job type, recording as unknown");
                JobType::unknown()
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// All registered type names, sorted
    pub fn job_types(&self) -> Vec<&str> {
        self.known.iter().map(|t| t.as_ref()).collect()
    }
}

impl Default for JobTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Job type names are lowercase ASCII words joined by dashes
pub fn is_valid_job_type_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}
