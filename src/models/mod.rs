//! # Job Records
//!
//! - [`Job`] - a single unit of work with its lifecycle timestamps and state tag
//! - [`JobResult`] - the outcome reported once a job finishes
//! - [`OutcomeStatus`] - success or the classified failure kind, used as a metrics label

pub mod job;
pub mod job_result;

pub use job::Job;
pub use job_result::{JobError, JobResult, OutcomeStatus, SUCCESS_STATUS};
