//! # Job Tracker Configuration
//!
//! Settings for the metrics sink, the job-type registry and the runner,
//! layered with the `config` crate:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables prefixed with `JOB_TRACKER`, using `__` as the
//!    nesting separator (`JOB_TRACKER__METRICS__NAMESPACE=image_builder`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use job_tracker::config::TrackerConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TrackerConfig::load(Some(Path::new("config/worker.toml")))?;
//! let registry = config.job_type_registry();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::logging::get_environment;
use crate::metrics::MetricsConfig;
use crate::registry::{is_valid_job_type_name, JobTypeRegistry};

pub use error::ConfigurationError;
pub use loader::{ConfigLoader, ENV_PREFIX, ENV_SEPARATOR};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Deployment environment (`development`, `test`, `production`)
    pub environment: String,
    pub metrics: MetricsConfig,
    pub job_types: JobTypesConfig,
    pub runner: RunnerConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            environment: get_environment(),
            metrics: MetricsConfig::default(),
            job_types: JobTypesConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

/// Job types accepted in addition to the built-in set
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobTypesConfig {
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Return illegal lifecycle transitions as errors instead of logging and
    /// skipping them
    pub strict_transitions: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            strict_transitions: cfg!(debug_assertions),
        }
    }
}

impl TrackerConfig {
    /// Load defaults, then `path` if given, then `JOB_TRACKER__*` overrides
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigurationError> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = path {
            loader = loader.with_file(path);
        }
        loader.load()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.environment.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "environment",
                self.environment.clone(),
                "must not be empty",
            ));
        }

        self.metrics.validate()?;

        for name in &self.job_types.extra {
            if !is_valid_job_type_name(name) {
                return Err(ConfigurationError::invalid_value(
                    "job_types.extra",
                    name.clone(),
                    "job type names may only contain [a-z0-9-]",
                ));
            }
        }

        Ok(())
    }

    /// Built-in job types plus the configured extras
    pub fn job_type_registry(&self) -> JobTypeRegistry {
        JobTypeRegistry::with_extra_types(&self.job_types.extra)
    }
}
