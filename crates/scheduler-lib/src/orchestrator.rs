//! Single entry point over the monitor, predictor and both schedulers
//!
//! The four operations here are the whole public surface callers need:
//! submit a job, plan a carbon-aware batch, take a resource sample and ask
//! for a forecast. Health and metrics are updated as a side effect.

use crate::carbon::{
    CarbonConfig, CarbonScheduleResult, CarbonWindowScheduler, IntensitySource,
    SimulatedGridSource,
};
use crate::error::{SchedulerError, SchedulerResult};
use crate::health::{components, predictor_health, queue_health, HealthRegistry};
use crate::jobs::{
    JobExecutor, JobSchedulerConfig, MonitorUsageProbe, PriorityJobScheduler, SchedulingResult,
    SimulatedExecutor, UsageProbe,
};
use crate::models::{Job, ResourceSample};
use crate::monitor::ResourceMonitor;
use crate::observability::{SchedulerMetrics, StructuredLogger};
use crate::predictor::{
    PredictionOutcome, RecommendationThresholds, ResourcePredictor, MIN_SAMPLES,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

/// Facade tying the scheduling components together
pub struct Orchestrator {
    monitor: Arc<ResourceMonitor>,
    predictor: ResourcePredictor,
    jobs: PriorityJobScheduler,
    carbon: CarbonWindowScheduler,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Submit a job to the priority scheduler and drain what fits
    pub async fn schedule_job(&self, job: Job) -> SchedulerResult<SchedulingResult> {
        let result = self.jobs.schedule_job(job).await?;
        if let Some(health) = &self.health {
            let status = self.jobs.queue_status().await;
            let assessed = queue_health(
                &status,
                result.execution_result.failed_jobs.len(),
                self.jobs.config().starvation_threshold,
            );
            health.update(components::JOB_SCHEDULER, assessed).await;
        }
        Ok(result)
    }

    /// Place a batch of deferrable jobs into green windows
    pub async fn get_carbon_optimal_schedule(
        &self,
        jobs: &[Job],
    ) -> SchedulerResult<CarbonScheduleResult> {
        match self.carbon.get_carbon_optimal_schedule(jobs).await {
            Ok(result) => {
                if let Some(health) = &self.health {
                    health.set_healthy(components::CARBON_SCHEDULER).await;
                }
                Ok(result)
            }
            Err(SchedulerError::Forecast(reason)) => {
                warn!(reason = %reason, "Carbon forecast unavailable");
                if let Some(health) = &self.health {
                    health
                        .set_degraded(components::CARBON_SCHEDULER, reason.clone())
                        .await;
                }
                Err(SchedulerError::Forecast(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Take one resource sample; never fails
    ///
    /// A probe failure marks the monitor degraded and yields a zero-valued
    /// sample that is kept out of the history.
    pub async fn monitor_resources(&self) -> ResourceSample {
        match self.monitor.try_sample().await {
            Ok(sample) => {
                if let Some(health) = &self.health {
                    health.set_healthy(components::MONITOR).await;
                }
                sample
            }
            Err(e) => {
                warn!(probe = self.monitor.probe_name(), error = %e, "Resource monitoring failed");
                if let Some(health) = &self.health {
                    health
                        .set_degraded(components::MONITOR, format!("Probe error: {}", e))
                        .await;
                }
                ResourceSample::zeroed(Utc::now())
            }
        }
    }

    /// Forecast utilization `horizon_minutes` ahead
    pub async fn predict_resource_needs(&self, horizon_minutes: u32) -> PredictionOutcome {
        let outcome = self.predictor.predict(horizon_minutes).await;
        if let (Some(logger), Some(prediction)) = (&self.logger, outcome.prediction()) {
            logger.log_prediction(
                horizon_minutes,
                prediction.predicted_usage.cpu_usage,
                prediction.predicted_usage.memory_usage,
                prediction.confidence,
            );
        }
        if let Some(health) = &self.health {
            let samples = match &outcome {
                PredictionOutcome::InsufficientData { samples, .. } => *samples,
                PredictionOutcome::Available(_) => MIN_SAMPLES,
            };
            health
                .update(components::PREDICTOR, predictor_health(samples))
                .await;
        }
        outcome
    }

    pub fn monitor(&self) -> &Arc<ResourceMonitor> {
        &self.monitor
    }

    pub fn job_scheduler(&self) -> &PriorityJobScheduler {
        &self.jobs
    }

    pub fn carbon_scheduler(&self) -> &CarbonWindowScheduler {
        &self.carbon
    }
}

/// Builder for [`Orchestrator`]
///
/// Only the monitor is required. Usage defaults to live monitor samples,
/// execution to the simulated executor and carbon data to the simulated grid.
pub struct OrchestratorBuilder {
    monitor: Option<Arc<ResourceMonitor>>,
    usage_probe: Option<Arc<dyn UsageProbe>>,
    executor: Option<Arc<dyn JobExecutor>>,
    intensity_source: Option<Arc<dyn IntensitySource>>,
    job_config: JobSchedulerConfig,
    carbon_config: CarbonConfig,
    recommendation_thresholds: RecommendationThresholds,
    health: Option<HealthRegistry>,
    metrics: Option<SchedulerMetrics>,
    logger: Option<StructuredLogger>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            monitor: None,
            usage_probe: None,
            executor: None,
            intensity_source: None,
            job_config: JobSchedulerConfig::default(),
            carbon_config: CarbonConfig::default(),
            recommendation_thresholds: RecommendationThresholds::default(),
            health: None,
            metrics: None,
            logger: None,
        }
    }

    pub fn monitor(mut self, monitor: Arc<ResourceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn usage_probe(mut self, probe: Arc<dyn UsageProbe>) -> Self {
        self.usage_probe = Some(probe);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn JobExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn intensity_source(mut self, source: Arc<dyn IntensitySource>) -> Self {
        self.intensity_source = Some(source);
        self
    }

    pub fn job_config(mut self, config: JobSchedulerConfig) -> Self {
        self.job_config = config;
        self
    }

    pub fn carbon_config(mut self, config: CarbonConfig) -> Self {
        self.carbon_config = config;
        self
    }

    pub fn recommendation_thresholds(mut self, thresholds: RecommendationThresholds) -> Self {
        self.recommendation_thresholds = thresholds;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn metrics(mut self, metrics: SchedulerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> SchedulerResult<Orchestrator> {
        let monitor = self
            .monitor
            .ok_or_else(|| SchedulerError::Config("resource monitor is required".into()))?;

        let usage_probe = self
            .usage_probe
            .unwrap_or_else(|| Arc::new(MonitorUsageProbe::new(monitor.clone())));
        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(SimulatedExecutor::default()));
        let source = self
            .intensity_source
            .unwrap_or_else(|| Arc::new(SimulatedGridSource::new()));

        let mut jobs = PriorityJobScheduler::with_config(usage_probe, executor, self.job_config);
        let mut carbon = CarbonWindowScheduler::with_config(source, self.carbon_config)?;
        if let Some(metrics) = self.metrics {
            jobs = jobs.with_metrics(metrics.clone());
            carbon = carbon.with_metrics(metrics);
        }
        if let Some(logger) = &self.logger {
            jobs = jobs.with_logger(logger.clone());
            carbon = carbon.with_logger(logger.clone());
        }

        let predictor =
            ResourcePredictor::with_thresholds(monitor.clone(), self.recommendation_thresholds);

        Ok(Orchestrator {
            monitor,
            predictor,
            jobs,
            carbon,
            health: self.health,
            logger: self.logger,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
