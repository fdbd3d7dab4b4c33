//! Job priority computation
//!
//! Lower numbers are served first. The per-type and per-urgency tables are
//! fixed; unknown job types get [`UNKNOWN_TYPE_OFFSET`].

use crate::models::{Job, JobType, Urgency};

/// Starting point for every job
pub const BASE_PRIORITY: i64 = 100;

/// Offset applied to [`JobType::Other`]
pub const UNKNOWN_TYPE_OFFSET: i64 = 50;

/// Weight above which a job is treated as heavy
pub const HEAVY_WEIGHT_THRESHOLD: f64 = 2.0;

/// Penalty added to heavy jobs
pub const HEAVY_JOB_PENALTY: i64 = 20;

/// Per-type priority offset
pub fn type_offset(job_type: &JobType) -> i64 {
    match job_type {
        JobType::Training => 50,
        JobType::Inference => 10,
        JobType::BatchProcessing => 30,
        JobType::ModelOptimization => 40,
        JobType::Other(_) => UNKNOWN_TYPE_OFFSET,
    }
}

/// Per-urgency priority modifier
pub fn urgency_modifier(urgency: Urgency) -> i64 {
    match urgency {
        Urgency::Critical => -30,
        Urgency::High => -15,
        Urgency::Normal => 0,
        Urgency::Low => 15,
    }
}

/// Clamp a raw priority into the servable range, never below 1
pub fn finalize_priority(raw: i64) -> u32 {
    raw.clamp(1, u32::MAX as i64) as u32
}

/// Admission priority for a job
pub fn priority_for(job: &Job) -> u32 {
    let mut priority = BASE_PRIORITY + type_offset(&job.job_type) + urgency_modifier(job.urgency);
    if job.resource_weight > HEAVY_WEIGHT_THRESHOLD {
        priority += HEAVY_JOB_PENALTY;
    }
    finalize_priority(priority)
}
