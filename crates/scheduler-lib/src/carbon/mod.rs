//! Carbon-aware placement of deferrable jobs
//!
//! An [`IntensitySource`] supplies the current grid carbon intensity and a
//! 24-hour forecast. The [`CarbonWindowScheduler`] keeps the hours under the
//! green threshold and packs jobs into them, cleanest hour first.

mod forecast;
mod scheduler;

pub use forecast::SimulatedGridSource;
pub use scheduler::{
    carbon_savings, green_windows, pack_jobs, CarbonSavings, CarbonScheduleResult, CarbonWindow,
    CarbonWindowScheduler, ScheduledEntry, UnscheduledEntry,
};

use crate::error::{SchedulerError, SchedulerResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hours covered by a forecast
pub const FORECAST_HOURS: u32 = 24;

/// Forecast entry for one hour of the day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyIntensity {
    /// Hour of day, 0-23
    pub hour: u32,
    /// gCO2/kWh
    pub carbon_intensity: f64,
    pub renewable_percentage: f64,
}

/// Present grid carbon intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentIntensity {
    pub intensity_gco2_kwh: f64,
    pub timestamp: DateTime<Utc>,
    /// `renewable` or `mixed`
    pub source: String,
}

/// Supplier of carbon intensity figures
#[async_trait]
pub trait IntensitySource: Send + Sync {
    /// Intensity for each hour of the day
    async fn forecast(&self) -> Result<Vec<HourlyIntensity>>;

    /// Intensity right now
    async fn current(&self) -> Result<CurrentIntensity>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Tunables for carbon window scheduling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonConfig {
    /// Hours strictly below this intensity count as green
    pub green_threshold: f64,
    /// Job-hours each green window can absorb
    pub window_capacity: f64,
    /// Intensity assumed for running everything immediately
    pub baseline_intensity: f64,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            green_threshold: 350.0,
            window_capacity: 10.0,
            baseline_intensity: 450.0,
        }
    }
}

impl CarbonConfig {
    pub fn validate(&self) -> SchedulerResult<()> {
        if !self.green_threshold.is_finite() || self.green_threshold <= 0.0 {
            return Err(SchedulerError::Config(format!(
                "green_threshold must be positive, got {}",
                self.green_threshold
            )));
        }
        if !self.window_capacity.is_finite() || self.window_capacity < 0.0 {
            return Err(SchedulerError::Config(format!(
                "window_capacity must not be negative, got {}",
                self.window_capacity
            )));
        }
        if !self.baseline_intensity.is_finite() || self.baseline_intensity <= 0.0 {
            return Err(SchedulerError::Config(format!(
                "baseline_intensity must be positive, got {}",
                self.baseline_intensity
            )));
        }
        Ok(())
    }
}

/// Check that a forecast covers every hour exactly once with sane values
pub fn validate_forecast(forecast: &[HourlyIntensity]) -> SchedulerResult<()> {
    if forecast.len() != FORECAST_HOURS as usize {
        return Err(SchedulerError::Forecast(format!(
            "expected {} hourly entries, got {}",
            FORECAST_HOURS,
            forecast.len()
        )));
    }

    let mut seen = [false; FORECAST_HOURS as usize];
    for entry in forecast {
        if entry.hour >= FORECAST_HOURS {
            return Err(SchedulerError::Forecast(format!("hour {} out of range", entry.hour)));
        }
        if std::mem::replace(&mut seen[entry.hour as usize], true) {
            return Err(SchedulerError::Forecast(format!("hour {} listed twice", entry.hour)));
        }
        if !entry.carbon_intensity.is_finite() || entry.carbon_intensity < 0.0 {
            return Err(SchedulerError::Forecast(format!(
                "hour {} has invalid intensity {}",
                entry.hour, entry.carbon_intensity
            )));
        }
        if !(0.0..=100.0).contains(&entry.renewable_percentage) {
            return Err(SchedulerError::Forecast(format!(
                "hour {} has renewable percentage {} outside 0-100",
                entry.hour, entry.renewable_percentage
            )));
        }
    }
    Ok(())
}
