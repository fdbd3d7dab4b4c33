//! Error types surfaced to callers of the scheduling core

use thiserror::Error;

/// Errors returned by public scheduling operations
///
/// Transient conditions (probe hiccups, a single failing job, missing
/// history) are not errors; they show up inside the returned reports.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Malformed job descriptor
    #[error("invalid job: {0}")]
    InvalidJob(String),

    /// Carbon intensity source could not produce a usable forecast
    #[error("carbon forecast unavailable: {0}")]
    Forecast(String),

    /// Resource probe failure that could not be recovered
    #[error("resource probe error: {0}")]
    Probe(String),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for scheduling operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
