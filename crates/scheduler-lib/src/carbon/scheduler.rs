//! Green window selection, first-fit packing and savings estimates

use super::{validate_forecast, CarbonConfig, CurrentIntensity, HourlyIntensity, IntensitySource};
use crate::error::{SchedulerError, SchedulerResult};
use crate::models::{CarbonPriority, Job};
use crate::observability::{SchedulerMetrics, StructuredLogger};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One-hour slot whose forecast intensity is under the green threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub carbon_intensity: f64,
    pub renewable_percentage: f64,
    /// Remaining job-hours; never negative
    pub capacity: f64,
}

impl CarbonWindow {
    pub fn fits(&self, duration_hours: f64) -> bool {
        self.capacity >= duration_hours
    }

    fn reserve(&mut self, duration_hours: f64) {
        self.capacity = (self.capacity - duration_hours).max(0.0);
    }
}

/// Placement of a job into a green window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    pub job_id: String,
    pub scheduled_start: u32,
    pub scheduled_end: u32,
    pub carbon_intensity: f64,
    pub renewable_percentage: f64,
    pub carbon_priority: CarbonPriority,
}

/// Job that no green window could take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledEntry {
    pub job_id: String,
    pub estimated_duration_hours: f64,
    pub reason: String,
}

/// Emissions estimate assuming 1 kWh per scheduled job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonSavings {
    pub total_savings_kg_co2: f64,
    pub percentage_reduction: f64,
    pub immediate_emissions_kg_co2: f64,
    pub green_emissions_kg_co2: f64,
    pub jobs_scheduled: usize,
}

/// Outcome of a carbon scheduling pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonScheduleResult {
    pub current_intensity: CurrentIntensity,
    pub scheduled_jobs: Vec<ScheduledEntry>,
    pub unscheduled_jobs: Vec<UnscheduledEntry>,
    pub carbon_savings: CarbonSavings,
    /// Windows with the capacity left after packing, cleanest first
    pub green_windows: Vec<CarbonWindow>,
}

/// Green windows from a forecast, sorted by ascending intensity
///
/// The sort is stable, so equal intensities keep hour order.
pub fn green_windows(forecast: &[HourlyIntensity], config: &CarbonConfig) -> Vec<CarbonWindow> {
    let mut windows: Vec<CarbonWindow> = forecast
        .iter()
        .filter(|entry| entry.carbon_intensity < config.green_threshold)
        .map(|entry| CarbonWindow {
            start_hour: entry.hour,
            end_hour: entry.hour + 1,
            carbon_intensity: entry.carbon_intensity,
            renewable_percentage: entry.renewable_percentage,
            capacity: config.window_capacity,
        })
        .collect();
    windows.sort_by(|a, b| a.carbon_intensity.total_cmp(&b.carbon_intensity));
    windows
}

/// Greedy first-fit: each job, in input order, takes the first window with room
pub fn pack_jobs(
    jobs: &[Job],
    windows: &mut [CarbonWindow],
) -> (Vec<ScheduledEntry>, Vec<UnscheduledEntry>) {
    let mut scheduled = Vec::new();
    let mut unscheduled = Vec::new();

    for job in jobs {
        let duration = job.estimated_duration_hours;
        match windows.iter_mut().find(|w| w.fits(duration)) {
            Some(window) => {
                window.reserve(duration);
                scheduled.push(ScheduledEntry {
                    job_id: job.id.clone(),
                    scheduled_start: window.start_hour,
                    scheduled_end: window.end_hour,
                    carbon_intensity: window.carbon_intensity,
                    renewable_percentage: window.renewable_percentage,
                    carbon_priority: job.carbon_priority,
                });
            }
            None => {
                let reason = if windows.is_empty() {
                    "no green windows in forecast".to_string()
                } else {
                    format!("no green window with {} hours of capacity left", duration)
                };
                unscheduled.push(UnscheduledEntry {
                    job_id: job.id.clone(),
                    estimated_duration_hours: duration,
                    reason,
                });
            }
        }
    }

    (scheduled, unscheduled)
}

/// Savings of the green placement against running at the baseline intensity
pub fn carbon_savings(scheduled: &[ScheduledEntry], baseline_intensity: f64) -> CarbonSavings {
    let n = scheduled.len();
    if n == 0 {
        return CarbonSavings::default();
    }

    let mean_intensity =
        scheduled.iter().map(|e| e.carbon_intensity).sum::<f64>() / n as f64;
    let immediate = n as f64 * baseline_intensity / 1000.0;
    let green = n as f64 * mean_intensity / 1000.0;
    let savings = immediate - green;
    let percentage = if immediate > 0.0 {
        savings / immediate * 100.0
    } else {
        0.0
    };

    CarbonSavings {
        total_savings_kg_co2: savings.max(0.0),
        percentage_reduction: percentage.max(0.0),
        immediate_emissions_kg_co2: immediate,
        green_emissions_kg_co2: green,
        jobs_scheduled: n,
    }
}

/// Places deferrable jobs into low-carbon hours
///
/// Window capacity lives only for the duration of one call; every call
/// starts from a fresh forecast.
pub struct CarbonWindowScheduler {
    source: Arc<dyn IntensitySource>,
    config: CarbonConfig,
    metrics: Option<SchedulerMetrics>,
    logger: Option<StructuredLogger>,
}

impl CarbonWindowScheduler {
    pub fn new(source: Arc<dyn IntensitySource>) -> Self {
        Self {
            source,
            config: CarbonConfig::default(),
            metrics: None,
            logger: None,
        }
    }

    pub fn with_config(source: Arc<dyn IntensitySource>, config: CarbonConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(source)
        })
    }

    pub fn with_metrics(mut self, metrics: SchedulerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &CarbonConfig {
        &self.config
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Pack `jobs` into the green hours of the current forecast
    pub async fn get_carbon_optimal_schedule(
        &self,
        jobs: &[Job],
    ) -> SchedulerResult<CarbonScheduleResult> {
        for job in jobs {
            job.validate()?;
        }

        let current_intensity = self
            .source
            .current()
            .await
            .map_err(|e| SchedulerError::Forecast(format!("current intensity: {:#}", e)))?;
        let forecast = self
            .source
            .forecast()
            .await
            .map_err(|e| SchedulerError::Forecast(format!("{:#}", e)))?;
        validate_forecast(&forecast)?;

        let mut windows = green_windows(&forecast, &self.config);
        debug!(
            source = self.source.name(),
            green_windows = windows.len(),
            jobs = jobs.len(),
            "Packing jobs into green windows"
        );

        let (scheduled_jobs, unscheduled_jobs) = pack_jobs(jobs, &mut windows);
        let savings = carbon_savings(&scheduled_jobs, self.config.baseline_intensity);

        if let Some(metrics) = &self.metrics {
            metrics.record_carbon_schedule(savings.total_savings_kg_co2, unscheduled_jobs.len());
        }
        if let Some(logger) = &self.logger {
            logger.log_carbon_schedule(
                scheduled_jobs.len(),
                unscheduled_jobs.len(),
                windows.len(),
                savings.total_savings_kg_co2,
            );
        }

        Ok(CarbonScheduleResult {
            current_intensity,
            scheduled_jobs,
            unscheduled_jobs,
            carbon_savings: savings,
            green_windows: windows,
        })
    }
}
