//! Observability for the scheduling core
//!
//! Provides:
//! - Prometheus metrics (queue depth and age, drain latency, job outcomes,
//!   carbon savings, resource usage)
//! - Event-tagged structured logging with tracing

use crate::models::ResourceSample;
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge, Gauge, GaugeVec, Histogram, IntCounter,
    IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SchedulerMetricsInner> = OnceLock::new();

struct SchedulerMetricsInner {
    jobs_scheduled: IntCounterVec,
    jobs_executed: IntCounterVec,
    jobs_failed: IntCounter,
    queue_depth: IntGauge,
    oldest_queued_seconds: Gauge,
    drain_latency_seconds: Histogram,
    sample_latency_seconds: Histogram,
    probe_errors: IntCounter,
    history_size: IntGauge,
    resource_usage_percent: GaugeVec,
    carbon_savings_kg: Gauge,
    carbon_unscheduled_jobs: IntCounter,
}

impl SchedulerMetricsInner {
    fn new() -> Self {
        Self {
            jobs_scheduled: register_int_counter_vec!(
                "carbon_scheduler_jobs_scheduled_total",
                "Jobs submitted to the priority queue",
                &["job_type", "urgency"]
            )
            .expect("Failed to register jobs_scheduled"),

            jobs_executed: register_int_counter_vec!(
                "carbon_scheduler_jobs_executed_total",
                "Jobs admitted and executed successfully",
                &["job_type"]
            )
            .expect("Failed to register jobs_executed"),

            jobs_failed: register_int_counter!(
                "carbon_scheduler_jobs_failed_total",
                "Jobs whose execution returned an error"
            )
            .expect("Failed to register jobs_failed"),

            queue_depth: register_int_gauge!(
                "carbon_scheduler_queue_depth",
                "Jobs currently waiting for admission"
            )
            .expect("Failed to register queue_depth"),

            oldest_queued_seconds: register_gauge!(
                "carbon_scheduler_oldest_queued_seconds",
                "Age of the longest-waiting queued job"
            )
            .expect("Failed to register oldest_queued_seconds"),

            drain_latency_seconds: register_histogram!(
                "carbon_scheduler_drain_latency_seconds",
                "Time spent draining the job queue",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register drain_latency_seconds"),

            sample_latency_seconds: register_histogram!(
                "carbon_scheduler_sample_latency_seconds",
                "Time spent reading the resource probe",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register sample_latency_seconds"),

            probe_errors: register_int_counter!(
                "carbon_scheduler_probe_errors_total",
                "Resource probe read failures"
            )
            .expect("Failed to register probe_errors"),

            history_size: register_int_gauge!(
                "carbon_scheduler_history_samples",
                "Samples held in the resource history"
            )
            .expect("Failed to register history_size"),

            resource_usage_percent: register_gauge_vec!(
                "carbon_scheduler_resource_usage_percent",
                "Most recent sampled utilization",
                &["resource"]
            )
            .expect("Failed to register resource_usage_percent"),

            carbon_savings_kg: register_gauge!(
                "carbon_scheduler_last_savings_kg_co2",
                "Estimated savings of the last carbon schedule"
            )
            .expect("Failed to register carbon_savings_kg"),

            carbon_unscheduled_jobs: register_int_counter!(
                "carbon_scheduler_unscheduled_jobs_total",
                "Jobs that found no green window with capacity"
            )
            .expect("Failed to register carbon_unscheduled_jobs"),
        }
    }
}

/// Handle to the process-wide scheduler metrics
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct SchedulerMetrics {
    _private: (),
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SchedulerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SchedulerMetricsInner {
        GLOBAL_METRICS.get_or_init(SchedulerMetricsInner::new)
    }

    pub fn inc_jobs_scheduled(&self, job_type: &str, urgency: &str) {
        self.inner()
            .jobs_scheduled
            .with_label_values(&[job_type, urgency])
            .inc();
    }

    pub fn inc_jobs_executed(&self, job_type: &str) {
        self.inner().jobs_executed.with_label_values(&[job_type]).inc();
    }

    pub fn inc_jobs_failed(&self) {
        self.inner().jobs_failed.inc();
    }

    pub fn set_queue_status(&self, depth: usize, oldest_age_secs: f64) {
        self.inner().queue_depth.set(depth as i64);
        self.inner().oldest_queued_seconds.set(oldest_age_secs);
    }

    pub fn observe_drain_latency(&self, duration_secs: f64) {
        self.inner().drain_latency_seconds.observe(duration_secs);
    }

    pub fn observe_sample_latency(&self, duration_secs: f64) {
        self.inner().sample_latency_seconds.observe(duration_secs);
    }

    pub fn inc_probe_errors(&self) {
        self.inner().probe_errors.inc();
    }

    pub fn set_history_size(&self, samples: i64) {
        self.inner().history_size.set(samples);
    }

    pub fn set_resource_usage(&self, sample: &ResourceSample) {
        let usage = &self.inner().resource_usage_percent;
        usage.with_label_values(&["cpu"]).set(sample.cpu_usage);
        usage.with_label_values(&["memory"]).set(sample.memory_usage);
        usage.with_label_values(&["gpu"]).set(sample.gpu_usage);
        usage.with_label_values(&["storage"]).set(sample.storage_usage);
    }

    pub fn record_carbon_schedule(&self, savings_kg: f64, unscheduled: usize) {
        self.inner().carbon_savings_kg.set(savings_kg);
        self.inner().carbon_unscheduled_jobs.inc_by(unscheduled as u64);
    }
}

/// Structured logger for scheduling events
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn log_job_scheduled(&self, job_id: &str, job_type: &str, priority: u32, queue_len: usize) {
        info!(
            event = "job_scheduled",
            node = %self.node_name,
            job_id = %job_id,
            job_type = %job_type,
            priority = priority,
            queue_len = queue_len,
            "Job queued"
        );
    }

    pub fn log_job_executed(&self, job_id: &str, job_type: &str, execution_ms: u64) {
        info!(
            event = "job_executed",
            node = %self.node_name,
            job_id = %job_id,
            job_type = %job_type,
            execution_ms = execution_ms,
            "Job completed"
        );
    }

    pub fn log_job_failed(&self, job_id: &str, error: &str) {
        warn!(
            event = "job_failed",
            node = %self.node_name,
            job_id = %job_id,
            error = %error,
            "Job execution failed, not re-queued"
        );
    }

    pub fn log_carbon_schedule(
        &self,
        scheduled: usize,
        unscheduled: usize,
        green_windows: usize,
        savings_kg: f64,
    ) {
        if unscheduled > 0 {
            warn!(
                event = "carbon_schedule_computed",
                node = %self.node_name,
                scheduled = scheduled,
                unscheduled = unscheduled,
                green_windows = green_windows,
                savings_kg_co2 = savings_kg,
                "Carbon schedule left jobs without a green window"
            );
        } else {
            info!(
                event = "carbon_schedule_computed",
                node = %self.node_name,
                scheduled = scheduled,
                green_windows = green_windows,
                savings_kg_co2 = savings_kg,
                "Carbon schedule computed"
            );
        }
    }

    pub fn log_prediction(&self, horizon_minutes: u32, cpu: f64, memory: f64, confidence: f64) {
        info!(
            event = "prediction_generated",
            node = %self.node_name,
            horizon_minutes = horizon_minutes,
            predicted_cpu = cpu,
            predicted_memory = memory,
            confidence = confidence,
            "Generated resource prediction"
        );
    }

    pub fn log_startup(&self, version: &str, probe: &str) {
        info!(
            event = "scheduler_started",
            node = %self.node_name,
            version = %version,
            probe = %probe,
            "Scheduler started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scheduler_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Scheduler shutting down"
        );
    }
}
