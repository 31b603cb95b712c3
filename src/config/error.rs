//! Configuration Error Types
//!
//! Errors raised while loading or validating tracker settings. Each variant
//! names the offending field or file so the message is actionable on its own.

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Configuration file given explicitly but missing on disk
    #[error("Configuration file not found: {file_path}")]
    FileNotFound { file_path: String },

    /// Any failure reported by the layered loader (bad TOML, wrong types)
    #[error("Failed to load configuration from {source_name}: {error}")]
    LoadError { source_name: String, error: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn file_not_found<P: Into<String>>(file_path: P) -> Self {
        Self::FileNotFound {
            file_path: file_path.into(),
        }
    }

    pub fn load_error<S: Into<String>, E: std::fmt::Display>(source_name: S, error: E) -> Self {
        Self::LoadError {
            source_name: source_name.into(),
            error: error.to_string(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value<F: Into<String>, V: Into<String>, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }
}
