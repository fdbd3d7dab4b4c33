//! Pseudo-random resource probe
//!
//! Stands in for real telemetry on hosts without a supported backend and in
//! demos. Seed it for reproducible sequences.

use super::ResourceProbe;
use crate::models::ResourceReading;
use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Probe producing plausible but synthetic utilization figures
pub struct SimulatedProbe {
    rng: Mutex<StdRng>,
    gpu_available: bool,
    storage_usage: f64,
    network_io: AtomicU64,
}

impl SimulatedProbe {
    pub fn new(gpu_available: bool) -> Self {
        Self::with_rng(StdRng::from_entropy(), gpu_available)
    }

    pub fn seeded(seed: u64, gpu_available: bool) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), gpu_available)
    }

    fn with_rng(rng: StdRng, gpu_available: bool) -> Self {
        Self {
            rng: Mutex::new(rng),
            gpu_available,
            storage_usage: 42.0,
            network_io: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ResourceProbe for SimulatedProbe {
    async fn read(&self) -> Result<ResourceReading> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {}", e))?;

        let cpu_usage = rng.gen_range(5.0..75.0);
        let memory_usage = rng.gen_range(30.0..70.0);
        let gpu_usage = if self.gpu_available {
            rng.gen_range(20.0..80.0)
        } else {
            0.0
        };
        let storage_usage = (self.storage_usage + rng.gen_range(-0.5..0.5)).clamp(0.0, 100.0);
        let delta = rng.gen_range(1_000u64..1_000_000);
        let network_io = self.network_io.fetch_add(delta, Ordering::Relaxed) + delta;

        Ok(ResourceReading {
            cpu_usage,
            memory_usage,
            gpu_usage,
            storage_usage,
            network_io,
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
