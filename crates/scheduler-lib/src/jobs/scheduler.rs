//! Priority job scheduler with resource admission control
//!
//! Every submission is enqueued immediately, then the queue is drained for
//! as long as the tracked resources stay below their thresholds. Jobs that
//! cannot be admitted wait in the queue; they are never dropped for
//! resource reasons.

use super::executor::{ExecutionOutput, JobExecutor};
use super::priority::priority_for;
use super::queue::JobQueue;
use super::usage::{ResourceThresholds, UsageCoefficients, UsageProbe};
use crate::error::SchedulerResult;
use crate::models::{Job, ResourceUsage};
use crate::observability::{SchedulerMetrics, StructuredLogger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default bound on waiting for the queue lock during a drain
pub const DEFAULT_DEQUEUE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default number of finished jobs remembered
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Default queue wait after which the scheduler reports itself degraded
pub const DEFAULT_STARVATION_THRESHOLD: Duration = Duration::from_secs(300);

/// Configuration for the priority scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    pub thresholds: ResourceThresholds,
    pub usage_coefficients: UsageCoefficients,
    /// Applies to acquiring the next queue entry only, never to execution
    pub dequeue_timeout: Duration,
    pub history_capacity: usize,
    /// Oldest queued wait tolerated before health turns degraded
    pub starvation_threshold: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            thresholds: ResourceThresholds::default(),
            usage_coefficients: UsageCoefficients::default(),
            dequeue_timeout: DEFAULT_DEQUEUE_TIMEOUT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            starvation_threshold: DEFAULT_STARVATION_THRESHOLD,
        }
    }
}

/// A job that ran to completion during a drain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedJob {
    pub job_id: String,
    pub priority: u32,
    pub execution_time_ms: u64,
    pub result: ExecutionOutput,
}

/// A job whose execution failed; it is not retried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedJob {
    pub job_id: String,
    pub priority: u32,
    pub error: String,
}

/// What a single drain pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrainReport {
    pub jobs_executed: usize,
    pub executed_jobs: Vec<ExecutedJob>,
    pub failed_jobs: Vec<FailedJob>,
    pub remaining_queue_size: usize,
}

/// Result of [`PriorityJobScheduler::schedule_job`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub job_scheduled: bool,
    pub job_id: String,
    pub priority: u32,
    /// Queue size after the drain that followed this submission
    pub queue_position: usize,
    pub execution_result: DrainReport,
}

/// Receipt for a job placed on the queue without draining
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnqueueReceipt {
    pub job_id: String,
    pub priority: u32,
    pub queue_len: usize,
}

/// Snapshot of the waiting queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queued: usize,
    pub oldest_wait_secs: Option<f64>,
    pub queued_job_ids: Vec<String>,
}

/// Lifecycle state of a job known to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Completed,
    Failed,
}

/// Finished job remembered in the scheduling history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub job_id: String,
    pub job_type: String,
    pub priority: u32,
    pub state: JobState,
    pub finished_at: DateTime<Utc>,
    pub execution_time_ms: u64,
}

/// Priority queue plus admission-controlled drain loop
///
/// Queue insertion and removal go through one mutex, which keeps the FIFO
/// tie-break intact under concurrent submitters. Usage figures are read
/// once per drain and advanced locally, so two drains running at the same
/// time can both see stale headroom and over-admit. Admission is a soft
/// limit, not a guarantee.
pub struct PriorityJobScheduler {
    queue: Mutex<JobQueue>,
    usage_probe: Arc<dyn UsageProbe>,
    executor: Arc<dyn JobExecutor>,
    config: JobSchedulerConfig,
    history: Mutex<VecDeque<HistoryEntry>>,
    metrics: Option<SchedulerMetrics>,
    logger: Option<StructuredLogger>,
}

impl PriorityJobScheduler {
    pub fn new(usage_probe: Arc<dyn UsageProbe>, executor: Arc<dyn JobExecutor>) -> Self {
        Self::with_config(usage_probe, executor, JobSchedulerConfig::default())
    }

    pub fn with_config(
        usage_probe: Arc<dyn UsageProbe>,
        executor: Arc<dyn JobExecutor>,
        config: JobSchedulerConfig,
    ) -> Self {
        Self {
            queue: Mutex::new(JobQueue::new()),
            usage_probe,
            executor,
            config,
            history: Mutex::new(VecDeque::new()),
            metrics: None,
            logger: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SchedulerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &JobSchedulerConfig {
        &self.config
    }

    /// Enqueue a job and drain as far as resources allow
    pub async fn schedule_job(&self, job: Job) -> SchedulerResult<SchedulingResult> {
        let receipt = self.enqueue(job).await?;
        let execution_result = self.drain().await;

        Ok(SchedulingResult {
            job_scheduled: true,
            job_id: receipt.job_id,
            priority: receipt.priority,
            queue_position: execution_result.remaining_queue_size,
            execution_result,
        })
    }

    /// Validate and enqueue a job without draining
    pub async fn enqueue(&self, job: Job) -> SchedulerResult<EnqueueReceipt> {
        job.validate()?;

        let priority = priority_for(&job);
        let job_id = job.id.clone();
        let job_type = job.job_type.to_string();
        let urgency = job.urgency.as_str();

        let queue_len = {
            let mut queue = self.queue.lock().await;
            queue.push(priority, job);
            queue.len()
        };

        if let Some(metrics) = &self.metrics {
            metrics.inc_jobs_scheduled(&job_type, urgency);
        }
        if let Some(logger) = &self.logger {
            logger.log_job_scheduled(&job_id, &job_type, priority, queue_len);
        }

        Ok(EnqueueReceipt {
            job_id,
            priority,
            queue_len,
        })
    }

    /// Execute queued jobs while every tracked resource has headroom
    pub async fn drain(&self) -> DrainReport {
        let start = Instant::now();
        let mut report = DrainReport::default();

        match self.usage_probe.current_usage().await {
            Ok(usage) => self.drain_with(usage, &mut report).await,
            Err(e) => {
                warn!(error = %e, "Resource usage unavailable, leaving jobs queued");
            }
        }

        report.jobs_executed = report.executed_jobs.len();
        report.remaining_queue_size = self.queue_len().await;

        if let Some(metrics) = &self.metrics {
            metrics.observe_drain_latency(start.elapsed().as_secs_f64());
            let status = self.queue_status().await;
            metrics.set_queue_status(status.queued, status.oldest_wait_secs.unwrap_or(0.0));
        }

        debug!(
            executed = report.jobs_executed,
            failed = report.failed_jobs.len(),
            remaining = report.remaining_queue_size,
            "Drain complete"
        );
        report
    }

    async fn drain_with(&self, mut usage: ResourceUsage, report: &mut DrainReport) {
        loop {
            if !self.config.thresholds.admits(&usage) {
                debug!(
                    cpu = usage.cpu,
                    memory = usage.memory,
                    gpu = usage.gpu,
                    "Resource thresholds reached, stopping drain"
                );
                break;
            }

            let next = match tokio::time::timeout(self.config.dequeue_timeout, self.queue.lock()).await {
                Ok(mut queue) => queue.pop(),
                Err(_) => {
                    debug!("Timed out waiting for the job queue");
                    break;
                }
            };
            let Some(entry) = next else { break };

            let job = entry.job;
            let started = Instant::now();
            let outcome = self.executor.execute(&job).await;
            let execution_time_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_jobs_executed(job.job_type.as_str());
                    }
                    if let Some(logger) = &self.logger {
                        logger.log_job_executed(&job.id, job.job_type.as_str(), execution_time_ms);
                    }
                    self.remember(&job, entry.priority, JobState::Completed, execution_time_ms)
                        .await;
                    report.executed_jobs.push(ExecutedJob {
                        job_id: job.id.clone(),
                        priority: entry.priority,
                        execution_time_ms,
                        result,
                    });
                    usage = self
                        .config
                        .usage_coefficients
                        .apply(&usage, job.resource_weight);
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "Job execution failed");
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_jobs_failed();
                    }
                    if let Some(logger) = &self.logger {
                        logger.log_job_failed(&job.id, &e.to_string());
                    }
                    self.remember(&job, entry.priority, JobState::Failed, execution_time_ms)
                        .await;
                    report.failed_jobs.push(FailedJob {
                        job_id: job.id.clone(),
                        priority: entry.priority,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    async fn remember(&self, job: &Job, priority: u32, state: JobState, execution_time_ms: u64) {
        let mut history = self.history.lock().await;
        history.push_back(HistoryEntry {
            job_id: job.id.clone(),
            job_type: job.job_type.to_string(),
            priority,
            state,
            finished_at: Utc::now(),
            execution_time_ms,
        });
        while history.len() > self.config.history_capacity.max(1) {
            history.pop_front();
        }
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Queue depth, longest wait and service order
    pub async fn queue_status(&self) -> QueueStatus {
        let queue = self.queue.lock().await;
        QueueStatus {
            queued: queue.len(),
            oldest_wait_secs: queue.oldest_age().map(|d| d.as_secs_f64()),
            queued_job_ids: queue.ordered_ids(),
        }
    }

    /// Current state of a job, if it is queued or still in the history
    pub async fn job_state(&self, job_id: &str) -> Option<JobState> {
        if self.queue.lock().await.contains(job_id) {
            return Some(JobState::Queued);
        }
        let history = self.history.lock().await;
        history
            .iter()
            .rev()
            .find(|entry| entry.job_id == job_id)
            .map(|entry| entry.state)
    }

    /// Finished jobs, oldest first
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().await.iter().cloned().collect()
    }
}
