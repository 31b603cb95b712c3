// Per-job lifecycle state tag
//
// The aggregate tracker trusts its callers to drive every job through
// enqueue -> dequeue -> (cancel | finish) exactly once. The runner keeps one of
// these tags on each job record and validates every transition against it.

pub mod events;
pub mod states;

pub use events::JobEvent;
pub use states::JobState;
