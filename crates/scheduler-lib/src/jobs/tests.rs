//! Tests for the priority job scheduler drain loop

use super::*;
use crate::error::SchedulerError;
use crate::models::{Job, ResourceUsage, Urgency};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

fn usage(cpu: f64, memory: f64, gpu: f64) -> ResourceUsage {
    ResourceUsage { cpu, memory, gpu }
}

fn idle() -> ResourceUsage {
    usage(0.0, 0.0, 0.0)
}

fn busy() -> ResourceUsage {
    usage(95.0, 50.0, 50.0)
}

/// Executor that fails for a fixed set of job ids
struct FlakyExecutor {
    failing: Vec<String>,
}

#[async_trait]
impl JobExecutor for FlakyExecutor {
    async fn execute(&self, job: &Job) -> Result<ExecutionOutput> {
        if self.failing.iter().any(|id| id == &job.id) {
            anyhow::bail!("backend rejected {}", job.id);
        }
        Ok(ExecutionOutput::completed(job, "ok"))
    }
}

/// Usage probe that always errors
struct BrokenUsageProbe;

#[async_trait]
impl UsageProbe for BrokenUsageProbe {
    async fn current_usage(&self) -> Result<ResourceUsage> {
        anyhow::bail!("telemetry offline")
    }
}

fn scheduler_with(probe: Arc<StaticUsageProbe>) -> PriorityJobScheduler {
    PriorityJobScheduler::new(
        probe,
        Arc::new(SimulatedExecutor::new(ExecutionPolicy::instant())),
    )
}

fn executed_ids(report: &DrainReport) -> Vec<&str> {
    report.executed_jobs.iter().map(|j| j.job_id.as_str()).collect()
}

#[tokio::test]
async fn test_end_to_end_drain_order_by_priority() {
    let probe = Arc::new(StaticUsageProbe::new(busy()));
    let scheduler = scheduler_with(probe.clone());

    let a = scheduler
        .schedule_job(Job::new("a", "inference").with_urgency(Urgency::Critical))
        .await
        .unwrap();
    let b = scheduler
        .schedule_job(Job::new("b", "training").with_urgency(Urgency::Low))
        .await
        .unwrap();
    let c = scheduler
        .schedule_job(Job::new("c", "inference").with_urgency(Urgency::Normal))
        .await
        .unwrap();

    assert_eq!((a.priority, b.priority, c.priority), (80, 165, 110));
    assert_eq!(c.queue_position, 3);
    assert_eq!(c.execution_result.jobs_executed, 0);

    probe.set(idle());
    let report = scheduler.drain().await;

    assert_eq!(executed_ids(&report), vec!["a", "c", "b"]);
    let priorities: Vec<u32> = report.executed_jobs.iter().map(|j| j.priority).collect();
    assert_eq!(priorities, vec![80, 110, 165]);
    assert_eq!(report.jobs_executed, 3);
    assert_eq!(report.remaining_queue_size, 0);
}

#[tokio::test]
async fn test_schedule_executes_immediately_with_headroom() {
    let scheduler = scheduler_with(Arc::new(StaticUsageProbe::new(idle())));

    let result = scheduler
        .schedule_job(Job::new("solo", "batch_processing"))
        .await
        .unwrap();

    assert!(result.job_scheduled);
    assert_eq!(result.job_id, "solo");
    assert_eq!(result.priority, 130);
    assert_eq!(result.queue_position, 0);
    assert_eq!(executed_ids(&result.execution_result), vec!["solo"]);
    assert_eq!(result.execution_result.executed_jobs[0].result.status, "completed");
}

#[tokio::test]
async fn test_admission_denied_at_exact_threshold() {
    let probe = Arc::new(StaticUsageProbe::new(usage(80.0, 0.0, 0.0)));
    let scheduler = scheduler_with(probe.clone());

    let result = scheduler.schedule_job(Job::new("x", "inference")).await.unwrap();
    assert_eq!(result.execution_result.jobs_executed, 0);
    assert_eq!(result.queue_position, 1);

    probe.set(usage(0.0, 85.0, 0.0));
    assert_eq!(scheduler.drain().await.jobs_executed, 0);

    probe.set(usage(0.0, 0.0, 90.0));
    assert_eq!(scheduler.drain().await.jobs_executed, 0);

    probe.set(usage(79.999, 84.999, 89.999));
    assert_eq!(scheduler.drain().await.jobs_executed, 1);
}

#[tokio::test]
async fn test_self_throttling_within_one_drain() {
    let probe = Arc::new(StaticUsageProbe::new(busy()));
    let scheduler = scheduler_with(probe.clone());
    for i in 0..5 {
        scheduler.enqueue(Job::new(format!("j{}", i), "inference")).await.unwrap();
    }

    // cpu 55 -> 65 -> 75 -> 85: the fourth admission check fails
    probe.set(usage(55.0, 0.0, 0.0));
    let report = scheduler.drain().await;

    assert_eq!(executed_ids(&report), vec!["j0", "j1", "j2"]);
    assert_eq!(report.remaining_queue_size, 2);
}

#[tokio::test]
async fn test_heavy_jobs_block_sooner() {
    let probe = Arc::new(StaticUsageProbe::new(busy()));
    let scheduler = scheduler_with(probe.clone());
    for i in 0..4 {
        scheduler
            .enqueue(Job::new(format!("h{}", i), "batch_processing").with_resource_weight(3.0))
            .await
            .unwrap();
    }

    // gpu 10 -> 55 -> 100
    probe.set(usage(10.0, 10.0, 10.0));
    let report = scheduler.drain().await;

    assert_eq!(report.jobs_executed, 2);
    assert_eq!(report.remaining_queue_size, 2);
}

#[tokio::test]
async fn test_queue_fully_drains_when_headroom_persists() {
    let probe = Arc::new(StaticUsageProbe::new(busy()));
    let scheduler = scheduler_with(probe.clone());
    for i in 0..10 {
        scheduler.enqueue(Job::new(format!("q{}", i), "inference")).await.unwrap();
    }
    probe.set(idle());

    let mut drains = 0;
    while scheduler.queue_len().await > 0 {
        scheduler.drain().await;
        drains += 1;
        assert!(drains <= 10, "queue never drained");
    }

    assert_eq!(drains, 2);
    assert_eq!(scheduler.history().await.len(), 10);
}

#[tokio::test]
async fn test_repeated_schedule_calls_leave_nothing_behind() {
    let scheduler = scheduler_with(Arc::new(StaticUsageProbe::new(usage(30.0, 30.0, 30.0))));

    for i in 0..20 {
        scheduler
            .schedule_job(Job::new(format!("r{}", i), "model_optimization"))
            .await
            .unwrap();
    }

    assert_eq!(scheduler.queue_len().await, 0);
    assert_eq!(scheduler.history().await.len(), 20);
}

#[tokio::test]
async fn test_equal_priority_served_fifo() {
    let probe = Arc::new(StaticUsageProbe::new(busy()));
    let scheduler = scheduler_with(probe.clone());
    for id in ["first", "second", "third"] {
        scheduler.enqueue(Job::new(id, "inference")).await.unwrap();
    }

    probe.set(idle());
    let report = scheduler.drain().await;
    assert_eq!(executed_ids(&report), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_failed_job_is_reported_and_not_requeued() {
    let probe = Arc::new(StaticUsageProbe::new(busy()));
    let scheduler = PriorityJobScheduler::new(
        probe.clone(),
        Arc::new(FlakyExecutor {
            failing: vec!["bad".to_string()],
        }),
    );
    scheduler
        .enqueue(Job::new("bad", "inference").with_urgency(Urgency::Critical))
        .await
        .unwrap();
    scheduler.enqueue(Job::new("good", "inference")).await.unwrap();

    probe.set(idle());
    let report = scheduler.drain().await;

    assert_eq!(executed_ids(&report), vec!["good"]);
    assert_eq!(report.failed_jobs.len(), 1);
    assert_eq!(report.failed_jobs[0].job_id, "bad");
    assert!(report.failed_jobs[0].error.contains("backend rejected"));
    assert_eq!(report.remaining_queue_size, 0);

    assert_eq!(scheduler.job_state("bad").await, Some(JobState::Failed));
    assert_eq!(scheduler.job_state("good").await, Some(JobState::Completed));
}

#[tokio::test]
async fn test_usage_probe_failure_keeps_jobs_queued() {
    let scheduler = PriorityJobScheduler::new(
        Arc::new(BrokenUsageProbe),
        Arc::new(SimulatedExecutor::new(ExecutionPolicy::instant())),
    );

    let result = scheduler.schedule_job(Job::new("w", "inference")).await.unwrap();

    assert_eq!(result.execution_result.jobs_executed, 0);
    assert_eq!(result.queue_position, 1);
    assert_eq!(scheduler.job_state("w").await, Some(JobState::Queued));
}

#[tokio::test]
async fn test_invalid_job_rejected_and_not_enqueued() {
    let scheduler = scheduler_with(Arc::new(StaticUsageProbe::new(idle())));

    let err = scheduler
        .schedule_job(Job::new("neg", "inference").with_resource_weight(-1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulerError::InvalidJob(_)));
    assert!(err.to_string().contains("resource_weight"));
    assert_eq!(scheduler.queue_len().await, 0);
    assert_eq!(scheduler.job_state("neg").await, None);
}

#[tokio::test]
async fn test_queue_status_reports_waiting_jobs() {
    let scheduler = scheduler_with(Arc::new(StaticUsageProbe::new(busy())));
    scheduler.enqueue(Job::new("late", "training")).await.unwrap();
    scheduler
        .enqueue(Job::new("early", "inference").with_urgency(Urgency::High))
        .await
        .unwrap();

    let status = scheduler.queue_status().await;
    assert_eq!(status.queued, 2);
    assert!(status.oldest_wait_secs.is_some());
    assert_eq!(status.queued_job_ids, vec!["early", "late"]);
}

#[tokio::test]
async fn test_concurrent_submissions_all_execute() {
    let scheduler = Arc::new(scheduler_with(Arc::new(StaticUsageProbe::new(idle()))));

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                scheduler
                    .schedule_job(Job::new(format!("c{}", i), "inference"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    // Pick up anything a racing drain left behind
    for _ in 0..10 {
        if scheduler.queue_len().await == 0 {
            break;
        }
        scheduler.drain().await;
    }
    assert_eq!(scheduler.queue_len().await, 0);
    assert_eq!(scheduler.history().await.len(), 50);
}

#[tokio::test]
async fn test_history_is_bounded() {
    let config = JobSchedulerConfig {
        history_capacity: 3,
        ..Default::default()
    };
    let scheduler = PriorityJobScheduler::with_config(
        Arc::new(StaticUsageProbe::new(idle())),
        Arc::new(SimulatedExecutor::new(ExecutionPolicy::instant())),
        config,
    );

    for i in 0..5 {
        scheduler.schedule_job(Job::new(format!("h{}", i), "inference")).await.unwrap();
    }

    let ids: Vec<String> = scheduler.history().await.into_iter().map(|h| h.job_id).collect();
    assert_eq!(ids, vec!["h2", "h3", "h4"]);
}

#[tokio::test]
async fn test_monitor_backed_usage_probe() {
    use crate::monitor::{ResourceMonitor, SimulatedProbe};

    let monitor = Arc::new(ResourceMonitor::new(Arc::new(SimulatedProbe::seeded(3, false))));
    let scheduler = PriorityJobScheduler::new(
        Arc::new(MonitorUsageProbe::new(monitor.clone())),
        Arc::new(SimulatedExecutor::new(ExecutionPolicy::instant())),
    );

    // simulated cpu stays below 75 and memory below 70, so the first job is admitted
    let result = scheduler.schedule_job(Job::new("m", "inference")).await.unwrap();
    assert_eq!(result.execution_result.jobs_executed, 1);
    assert_eq!(monitor.len().await, 1);
}
