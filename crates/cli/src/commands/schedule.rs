//! Submit a job file to the priority scheduler

use anyhow::Result;
use scheduler_lib::{
    jobs::{ExecutionPolicy, SimulatedExecutor, StaticUsageProbe},
    monitor::SimulatedProbe,
    Job, Orchestrator, ResourceMonitor, ResourceUsage, SchedulingResult,
};
use serde::Serialize;
use std::sync::Arc;
use tabled::Tabled;

use crate::output::{color_status, print_info, print_json, print_rows, print_success, print_warning, OutputFormat};

/// Options for `gsched schedule`
pub struct ScheduleOptions {
    /// Fixed usage to admit against; `None` samples the simulated monitor
    pub usage: Option<ResourceUsage>,
    /// Multiplier on the simulated execution durations
    pub time_scale: f64,
    pub seed: Option<u64>,
}

#[derive(Tabled)]
struct SubmissionRow {
    #[tabled(rename = "Job")]
    job_id: String,
    #[tabled(rename = "Priority")]
    priority: u32,
    #[tabled(rename = "Executed")]
    executed: String,
    #[tabled(rename = "Failed")]
    failed: usize,
    #[tabled(rename = "Queued After")]
    queue_position: usize,
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Job")]
    job_id: String,
    #[tabled(rename = "Type")]
    job_type: String,
    #[tabled(rename = "Priority")]
    priority: u32,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Time (ms)")]
    execution_time_ms: u64,
}

#[derive(Serialize)]
struct ScheduleReport {
    submissions: Vec<SchedulingResult>,
    still_queued: Vec<String>,
}

/// Submit every job in order, draining after each submission
pub async fn run(jobs: Vec<Job>, options: ScheduleOptions, format: OutputFormat) -> Result<()> {
    let probe = match options.seed {
        Some(seed) => SimulatedProbe::seeded(seed, true),
        None => SimulatedProbe::new(true),
    };
    let monitor = Arc::new(ResourceMonitor::new(Arc::new(probe)));
    let executor = SimulatedExecutor::new(ExecutionPolicy::scaled(options.time_scale));

    let mut builder = Orchestrator::builder()
        .monitor(monitor)
        .executor(Arc::new(executor));
    if let Some(usage) = options.usage {
        builder = builder.usage_probe(Arc::new(StaticUsageProbe::new(usage)));
    }
    let orchestrator = builder.build()?;

    let mut submissions = Vec::with_capacity(jobs.len());
    for job in jobs {
        submissions.push(orchestrator.schedule_job(job).await?);
    }

    let scheduler = orchestrator.job_scheduler();
    let status = scheduler.queue_status().await;

    match format {
        OutputFormat::Json => {
            print_json(&ScheduleReport {
                submissions,
                still_queued: status.queued_job_ids,
            })?;
        }
        OutputFormat::Table => {
            let rows: Vec<SubmissionRow> = submissions
                .iter()
                .map(|s| SubmissionRow {
                    job_id: s.job_id.clone(),
                    priority: s.priority,
                    executed: s
                        .execution_result
                        .executed_jobs
                        .iter()
                        .map(|e| e.job_id.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    failed: s.execution_result.failed_jobs.len(),
                    queue_position: s.queue_position,
                })
                .collect();
            print_rows(rows, "No jobs submitted");

            let history: Vec<StateRow> = scheduler
                .history()
                .await
                .into_iter()
                .map(|h| StateRow {
                    job_id: h.job_id,
                    job_type: h.job_type,
                    priority: h.priority,
                    state: color_status(&format!("{:?}", h.state).to_lowercase()),
                    execution_time_ms: h.execution_time_ms,
                })
                .collect();
            if !history.is_empty() {
                println!();
                print_info("Execution order");
                print_rows(history, "No jobs executed");
            }

            println!();
            if status.queued == 0 {
                print_success("All jobs executed");
            } else {
                print_warning(&format!(
                    "{} job(s) still queued waiting for headroom: {}",
                    status.queued,
                    status.queued_job_ids.join(", ")
                ));
            }
        }
    }

    Ok(())
}
