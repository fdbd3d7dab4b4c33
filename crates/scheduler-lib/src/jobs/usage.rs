//! Resource usage sources and admission thresholds

use crate::models::ResourceUsage;
use crate::monitor::ResourceMonitor;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Provides the usage figures the admission check runs against
#[async_trait]
pub trait UsageProbe: Send + Sync {
    async fn current_usage(&self) -> Result<ResourceUsage>;
}

/// Usage probe backed by a live resource monitor sample
pub struct MonitorUsageProbe {
    monitor: Arc<ResourceMonitor>,
}

impl MonitorUsageProbe {
    pub fn new(monitor: Arc<ResourceMonitor>) -> Self {
        Self { monitor }
    }
}

#[async_trait]
impl UsageProbe for MonitorUsageProbe {
    async fn current_usage(&self) -> Result<ResourceUsage> {
        // A zero-filled fallback sample would look like full headroom
        let sample = self.monitor.try_sample().await?;
        Ok(ResourceUsage::from(&sample))
    }
}

/// Usage probe returning caller-controlled values
#[derive(Debug, Default)]
pub struct StaticUsageProbe {
    usage: Mutex<ResourceUsage>,
}

impl StaticUsageProbe {
    pub fn new(usage: ResourceUsage) -> Self {
        Self {
            usage: Mutex::new(usage),
        }
    }

    pub fn set(&self, usage: ResourceUsage) {
        if let Ok(mut current) = self.usage.lock() {
            *current = usage;
        }
    }
}

#[async_trait]
impl UsageProbe for StaticUsageProbe {
    async fn current_usage(&self) -> Result<ResourceUsage> {
        let usage = self
            .usage
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {}", e))?;
        Ok(*usage)
    }
}

/// Per-resource admission thresholds (percent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceThresholds {
    pub cpu: f64,
    pub memory: f64,
    pub gpu: f64,
}

impl Default for ResourceThresholds {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            memory: 85.0,
            gpu: 90.0,
        }
    }
}

impl ResourceThresholds {
    /// True only when every tracked resource is strictly below its threshold
    pub fn admits(&self, usage: &ResourceUsage) -> bool {
        usage.cpu < self.cpu && usage.memory < self.memory && usage.gpu < self.gpu
    }
}

/// Usage added per unit of job resource weight after execution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageCoefficients {
    pub cpu: f64,
    pub memory: f64,
    pub gpu: f64,
}

impl Default for UsageCoefficients {
    fn default() -> Self {
        Self {
            cpu: 10.0,
            memory: 5.0,
            gpu: 15.0,
        }
    }
}

impl UsageCoefficients {
    /// Account for a finished job of the given weight, clamped to 100
    pub fn apply(&self, usage: &ResourceUsage, weight: f64) -> ResourceUsage {
        ResourceUsage {
            cpu: (usage.cpu + weight * self.cpu).min(100.0),
            memory: (usage.memory + weight * self.memory).min(100.0),
            gpu: (usage.gpu + weight * self.gpu).min(100.0),
        }
    }
}
