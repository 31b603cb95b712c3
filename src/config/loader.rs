//! Layered configuration loading on top of the `config` crate.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::{debug, info};

use super::{ConfigurationError, TrackerConfig};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "JOB_TRACKER";

/// Nesting separator for environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Builder for a validated [`TrackerConfig`]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Layer a TOML file over the defaults. The file must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read overrides from `<prefix>__SECTION__KEY` instead of `JOB_TRACKER__*`
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> Result<TrackerConfig, ConfigurationError> {
        let defaults = Config::try_from(&TrackerConfig::default())
            .map_err(|e| ConfigurationError::load_error("defaults", e))?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = &self.file {
            if !path.exists() {
                return Err(ConfigurationError::file_not_found(
                    path.display().to_string(),
                ));
            }
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("job_types.extra")
                .with_list_parse_key("metrics.duration_buckets"),
        );

        let source_name = self
            .file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "environment".to_string());

        let config: TrackerConfig = builder
            .build()
            .and_then(|layered| layered.try_deserialize())
            .map_err(|e| ConfigurationError::load_error(source_name.clone(), e))?;

        config.validate()?;

        info!(
            environment = %config.environment,
            source = %source_name,
            extra_job_types = config.job_types.extra.len(),
            strict_transitions = config.runner.strict_transitions,
            "Job tracker configuration loaded"
        );

        Ok(config)
    }
}
