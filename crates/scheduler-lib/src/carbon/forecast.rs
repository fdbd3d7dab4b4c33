//! Simulated grid carbon intensity
//!
//! Daylight hours are cleaner (solar), nights are dominated by fossil
//! generation. Seed the source for reproducible forecasts.

use super::{CurrentIntensity, HourlyIntensity, IntensitySource, FORECAST_HOURS};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Readings under this intensity are labelled renewable
const RENEWABLE_LABEL_THRESHOLD: f64 = 350.0;

/// Floor applied to the current intensity
const MIN_CURRENT_INTENSITY: f64 = 200.0;

/// Synthetic intensity source with a solar-shaped daily curve
pub struct SimulatedGridSource {
    rng: Mutex<StdRng>,
}

impl Default for SimulatedGridSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGridSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Forecast entry for one hour of the day
    pub fn hourly(&self, hour: u32) -> Result<HourlyIntensity> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {}", e))?;

        let (carbon_intensity, renewable_percentage) = if (9..=17).contains(&hour) {
            (
                250.0 + rng.gen_range(-50.0..50.0),
                70.0 + rng.gen_range(-10.0..10.0),
            )
        } else {
            (
                450.0 + rng.gen_range(-50.0..50.0),
                30.0 + rng.gen_range(-10.0..10.0),
            )
        };

        Ok(HourlyIntensity {
            hour,
            carbon_intensity,
            renewable_percentage,
        })
    }

    /// Current intensity as it would read at `hour`
    pub fn current_at(&self, hour: u32) -> Result<CurrentIntensity> {
        let raw = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| anyhow::anyhow!("Lock poisoned: {}", e))?;
            if (8..=18).contains(&hour) {
                300.0 + rng.gen_range(-50.0..50.0)
            } else {
                450.0 + rng.gen_range(-30.0..30.0)
            }
        };

        // The label follows the unfloored reading
        let source = if raw < RENEWABLE_LABEL_THRESHOLD {
            "renewable"
        } else {
            "mixed"
        };

        Ok(CurrentIntensity {
            intensity_gco2_kwh: raw.max(MIN_CURRENT_INTENSITY),
            timestamp: Utc::now(),
            source: source.to_string(),
        })
    }
}

#[async_trait]
impl IntensitySource for SimulatedGridSource {
    async fn forecast(&self) -> Result<Vec<HourlyIntensity>> {
        (0..FORECAST_HOURS).map(|hour| self.hourly(hour)).collect()
    }

    async fn current(&self) -> Result<CurrentIntensity> {
        self.current_at(Utc::now().hour())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
