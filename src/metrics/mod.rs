//! # Worker Job Metrics
//!
//! Process-wide aggregation of job lifecycle observations, exposed for
//! pull-based scraping in the Prometheus text format.
//!
//! ## Metrics
//!
//! All names are prefixed with `<namespace>_<subsystem>_` (default
//! `composer_worker_`):
//!
//! - `total_jobs{type,status}` - finished jobs by outcome (counter)
//! - `pending_jobs{type}` - jobs waiting for a worker (gauge)
//! - `running_jobs{type}` - jobs currently executing (gauge)
//! - `job_duration_seconds{type,status}` - time spent running (histogram)
//! - `job_wait_duration_seconds{type}` - time spent queued (histogram)
//! - `skipped_observations_total{type,reason}` - transitions that were not recorded
//!
//! ## Usage
//!
//! ```rust
//! use job_tracker::metrics::{MetricsConfig, MetricsSink};
//! use job_tracker::registry::JobTypeRegistry;
//!
//! let sink = MetricsSink::new(&MetricsConfig::default()).unwrap();
//! let job_type = JobTypeRegistry::new().resolve("koji-init");
//!
//! sink.increment_pending(&job_type);
//! assert_eq!(sink.pending(&job_type), 1);
//!
//! let exposition = sink.render().unwrap();
//! assert!(exposition.contains("composer_worker_pending_jobs"));
//! ```

pub mod sink;

use serde::{Deserialize, Serialize};

use crate::config::ConfigurationError;

pub use sink::{GaugeSnapshot, HistogramSnapshot, MetricsSink, SkipReason};

/// Bucket boundaries in seconds, from sub-second depsolves to multi-hour image builds
pub const DEFAULT_DURATION_BUCKETS: [f64; 33] = [
    0.1, 0.2, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 40.0, 48.0, 64.0, 96.0, 128.0, 160.0, 192.0,
    224.0, 256.0, 320.0, 382.0, 448.0, 512.0, 640.0, 768.0, 896.0, 1024.0, 1280.0, 1536.0,
    1792.0, 2049.0, 3600.0, 7200.0, 14400.0,
];

/// Metrics sink configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub namespace: String,
    pub subsystem: String,
    /// Histogram bucket upper bounds in seconds, strictly increasing
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: "composer".to_string(),
            subsystem: "worker".to_string(),
            duration_buckets: DEFAULT_DURATION_BUCKETS.to_vec(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in [
            ("metrics.namespace", &self.namespace),
            ("metrics.subsystem", &self.subsystem),
        ] {
            if !is_valid_metric_name_part(value) {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value.clone(),
                    "must match [a-zA-Z_][a-zA-Z0-9_]*",
                ));
            }
        }

        if self.duration_buckets.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "metrics.duration_buckets",
                "[]",
                "at least one bucket is required",
            ));
        }

        let all_positive = self
            .duration_buckets
            .iter()
            .all(|bound| bound.is_finite() && *bound > 0.0);
        let increasing = self.duration_buckets.windows(2).all(|pair| pair[0] < pair[1]);
        if !all_positive || !increasing {
            return Err(ConfigurationError::invalid_value(
                "metrics.duration_buckets",
                format!("{:?}", self.duration_buckets),
                "buckets must be finite, positive and strictly increasing",
            ));
        }

        Ok(())
    }
}

fn is_valid_metric_name_part(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
