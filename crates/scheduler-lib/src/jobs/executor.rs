//! Job execution backends
//!
//! The scheduler hands admitted jobs to a [`JobExecutor`]. The simulated
//! backend only sleeps for a per-type duration; real backends replace it.

use crate::models::{Job, JobType};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output of a successfully executed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub status: String,
    pub job_type: String,
    pub output: String,
}

impl ExecutionOutput {
    pub fn completed(job: &Job, output: impl Into<String>) -> Self {
        Self {
            status: "completed".to_string(),
            job_type: job.job_type.to_string(),
            output: output.into(),
        }
    }
}

/// Runs admitted jobs
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job) -> Result<ExecutionOutput>;
}

/// Simulated duration per job type
#[derive(Debug, Clone)]
pub struct ExecutionPolicy {
    pub training: Duration,
    pub inference: Duration,
    pub default: Duration,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            training: Duration::from_secs(2),
            inference: Duration::from_millis(100),
            default: Duration::from_millis(500),
        }
    }
}

impl ExecutionPolicy {
    /// Policy with no delay at all
    pub fn instant() -> Self {
        Self {
            training: Duration::ZERO,
            inference: Duration::ZERO,
            default: Duration::ZERO,
        }
    }

    /// Default durations multiplied by `factor`
    pub fn scaled(factor: f64) -> Self {
        let base = Self::default();
        let factor = factor.max(0.0);
        Self {
            training: base.training.mul_f64(factor),
            inference: base.inference.mul_f64(factor),
            default: base.default.mul_f64(factor),
        }
    }

    pub fn duration_for(&self, job_type: &JobType) -> Duration {
        match job_type {
            JobType::Training => self.training,
            JobType::Inference => self.inference,
            _ => self.default,
        }
    }
}

/// Executor that sleeps according to an [`ExecutionPolicy`]
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutor {
    policy: ExecutionPolicy,
}

impl SimulatedExecutor {
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl JobExecutor for SimulatedExecutor {
    async fn execute(&self, job: &Job) -> Result<ExecutionOutput> {
        let duration = self.policy.duration_for(&job.job_type);
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
        Ok(ExecutionOutput::completed(job, format!("Result for {}", job.id)))
    }
}
