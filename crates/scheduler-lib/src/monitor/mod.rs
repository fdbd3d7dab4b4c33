//! Resource utilization monitoring
//!
//! A [`ResourceMonitor`] samples CPU, memory, GPU, storage and network
//! counters through a pluggable [`ResourceProbe`] and keeps a bounded,
//! in-memory rolling history of the samples it took.

mod host;
mod r#loop;
mod simulated;

#[cfg(test)]
mod tests;

pub use host::HostProbe;
pub use r#loop::{MonitorLoop, MonitorLoopBuilder, MonitorLoopConfig};
pub use simulated::SimulatedProbe;

use crate::models::{ResourceReading, ResourceSample};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default number of samples retained in the rolling history
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Source of raw resource readings
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    /// Read current utilization
    async fn read(&self) -> Result<ResourceReading>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Configuration for the resource monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Maximum samples kept; the oldest is evicted first
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Samples resource utilization and owns the rolling history
pub struct ResourceMonitor {
    probe: Arc<dyn ResourceProbe>,
    config: MonitorConfig,
    history: RwLock<VecDeque<ResourceSample>>,
}

impl ResourceMonitor {
    pub fn new(probe: Arc<dyn ResourceProbe>) -> Self {
        Self::with_config(probe, MonitorConfig::default())
    }

    pub fn with_config(probe: Arc<dyn ResourceProbe>, config: MonitorConfig) -> Self {
        let capacity = config.history_capacity.max(1);
        Self {
            probe,
            config: MonitorConfig {
                history_capacity: capacity,
            },
            history: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Take a sample and append it to the history
    ///
    /// Probe failures never propagate: a zero-valued sample is returned and
    /// the history is left untouched.
    pub async fn sample(&self) -> ResourceSample {
        match self.probe.read().await {
            Ok(reading) => {
                let sample = reading.stamp(Utc::now());
                self.record(sample.clone()).await;
                debug!(
                    probe = self.probe.name(),
                    cpu = sample.cpu_usage,
                    memory = sample.memory_usage,
                    gpu = sample.gpu_usage,
                    "Resource sample taken"
                );
                sample
            }
            Err(e) => {
                warn!(probe = self.probe.name(), error = %e, "Resource monitoring failed");
                ResourceSample::zeroed(Utc::now())
            }
        }
    }

    /// Like [`sample`](Self::sample) but reports whether the probe succeeded
    pub async fn try_sample(&self) -> Result<ResourceSample> {
        let reading = self.probe.read().await?;
        let sample = reading.stamp(Utc::now());
        self.record(sample.clone()).await;
        Ok(sample)
    }

    /// Append an externally produced sample to the history
    pub async fn record(&self, sample: ResourceSample) {
        let mut history = self.history.write().await;
        history.push_back(sample);
        while history.len() > self.config.history_capacity {
            history.pop_front();
        }
    }

    /// Last `n` samples, most recent last
    pub async fn history(&self, n: usize) -> Vec<ResourceSample> {
        let history = self.history.read().await;
        let skip = history.len().saturating_sub(n);
        history.iter().skip(skip).cloned().collect()
    }

    /// Most recent sample, if any
    pub async fn latest(&self) -> Option<ResourceSample> {
        self.history.read().await.back().cloned()
    }

    pub async fn len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.history.read().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.history_capacity
    }

    pub fn probe_name(&self) -> &str {
        self.probe.name()
    }
}
