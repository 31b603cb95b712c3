//! # Registry Infrastructure
//!
//! Registries that bound the label space of the metrics sink.
//!
//! - **JobTypeRegistry**: the fixed set of job type tags; anything else is
//!   recorded as `unknown`

pub mod job_types;

pub use job_types::{is_valid_job_type_name, JobType, JobTypeRegistry, BUILTIN_JOB_TYPES};
