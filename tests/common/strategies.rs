use proptest::prelude::*;

use job_tracker::registry::BUILTIN_JOB_TYPES;
use job_tracker::taxonomy::ErrorKind;

/// What happens to one job after it is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPath {
    StaysPending,
    CanceledPending,
    StaysRunning,
    CanceledRunning,
    Finished(Option<ErrorKind>),
}

pub fn job_type_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(BUILTIN_JOB_TYPES.to_vec())
}

pub fn error_kind_strategy() -> impl Strategy<Value = ErrorKind> {
    prop::sample::select(ErrorKind::ALL.to_vec())
}

pub fn job_path_strategy() -> impl Strategy<Value = JobPath> {
    prop_oneof![
        Just(JobPath::StaysPending),
        Just(JobPath::CanceledPending),
        Just(JobPath::StaysRunning),
        Just(JobPath::CanceledRunning),
        prop::option::of(error_kind_strategy()).prop_map(JobPath::Finished),
    ]
}

/// Up to 40 jobs, each with a type, a path, a wait and a run time in seconds
pub fn workload_strategy() -> impl Strategy<Value = Vec<(&'static str, JobPath, u32, u32)>> {
    prop::collection::vec(
        (job_type_strategy(), job_path_strategy(), 0u32..3_600, 0u32..14_400),
        0..40,
    )
}
