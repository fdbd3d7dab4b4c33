//! Workload-aware job scheduling
//!
//! Jobs are prioritized from their type, urgency and weight, queued, and
//! executed only while CPU, memory and GPU usage stay under configured
//! thresholds.

mod executor;
mod priority;
mod queue;
mod scheduler;
mod usage;

#[cfg(test)]
mod tests;

pub use executor::{ExecutionOutput, ExecutionPolicy, JobExecutor, SimulatedExecutor};
pub use priority::{
    finalize_priority, priority_for, type_offset, urgency_modifier, BASE_PRIORITY, HEAVY_JOB_PENALTY,
    HEAVY_WEIGHT_THRESHOLD, UNKNOWN_TYPE_OFFSET,
};
pub use queue::{JobQueue, QueueEntry};
pub use scheduler::{
    DrainReport, EnqueueReceipt, ExecutedJob, FailedJob, HistoryEntry, JobSchedulerConfig,
    JobState, PriorityJobScheduler, QueueStatus, SchedulingResult, DEFAULT_DEQUEUE_TIMEOUT,
    DEFAULT_STARVATION_THRESHOLD,
};
pub use usage::{
    MonitorUsageProbe, ResourceThresholds, StaticUsageProbe, UsageCoefficients, UsageProbe,
};
