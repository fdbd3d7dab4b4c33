//! Periodic resource sampling loop
//!
//! Drives [`ResourceMonitor::sample`] on a fixed interval until a shutdown
//! signal arrives, feeding health and metrics as it goes.

use super::ResourceMonitor;
use crate::health::{components, HealthRegistry};
use crate::observability::SchedulerMetrics;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Configuration for the sampling loop
#[derive(Debug, Clone)]
pub struct MonitorLoopConfig {
    /// Interval between samples (default: 30 seconds)
    pub interval: Duration,
    /// Consecutive probe failures before the monitor is reported unhealthy
    pub failure_threshold: u32,
}

impl Default for MonitorLoopConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            failure_threshold: 5,
        }
    }
}

/// Sampling loop owning a handle to the shared monitor
pub struct MonitorLoop {
    monitor: Arc<ResourceMonitor>,
    config: MonitorLoopConfig,
    health: Option<HealthRegistry>,
    metrics: Option<SchedulerMetrics>,
    consecutive_failures: u32,
}

impl MonitorLoop {
    pub fn new(monitor: Arc<ResourceMonitor>, config: MonitorLoopConfig) -> Self {
        Self {
            monitor,
            config,
            health: None,
            metrics: None,
            consecutive_failures: 0,
        }
    }

    /// Run until the shutdown channel fires
    pub async fn run(mut self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            probe = self.monitor.probe_name(),
            "Starting resource monitor loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down resource monitor loop");
                    break;
                }
            }
        }
    }

    /// Take one sample and update health/metrics accordingly
    async fn tick(&mut self) {
        let start = Instant::now();
        let result = self.monitor.try_sample().await;
        let elapsed = start.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.observe_sample_latency(elapsed.as_secs_f64());
        }

        match result {
            Ok(sample) => {
                if self.consecutive_failures > 0 {
                    info!(
                        failures = self.consecutive_failures,
                        "Resource probe recovered"
                    );
                }
                self.consecutive_failures = 0;
                if let Some(metrics) = &self.metrics {
                    metrics.set_resource_usage(&sample);
                    metrics.set_history_size(self.monitor.len().await as i64);
                }
                if let Some(health) = &self.health {
                    health.set_healthy(components::MONITOR).await;
                }
                debug!(
                    cpu = sample.cpu_usage,
                    memory = sample.memory_usage,
                    elapsed_ms = elapsed.as_millis(),
                    "Monitor tick complete"
                );
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "Resource probe failed"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.inc_probe_errors();
                }
                if let Some(health) = &self.health {
                    if self.consecutive_failures >= self.config.failure_threshold {
                        health
                            .set_unhealthy(components::MONITOR, format!("Probe failing: {}", e))
                            .await;
                    } else {
                        health
                            .set_degraded(components::MONITOR, format!("Probe error: {}", e))
                            .await;
                    }
                }
            }
        }
    }
}

/// Builder for creating the sampling loop
pub struct MonitorLoopBuilder {
    monitor: Option<Arc<ResourceMonitor>>,
    config: MonitorLoopConfig,
    health: Option<HealthRegistry>,
    metrics: Option<SchedulerMetrics>,
}

impl MonitorLoopBuilder {
    pub fn new() -> Self {
        Self {
            monitor: None,
            config: MonitorLoopConfig::default(),
            health: None,
            metrics: None,
        }
    }

    pub fn monitor(mut self, monitor: Arc<ResourceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
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

    pub fn build(self) -> Result<MonitorLoop> {
        let monitor = self
            .monitor
            .ok_or_else(|| anyhow::anyhow!("Monitor is required"))?;
        if self.config.interval.is_zero() {
            anyhow::bail!("Monitor interval must be greater than zero");
        }

        let mut monitor_loop = MonitorLoop::new(monitor, self.config);
        monitor_loop.health = self.health;
        monitor_loop.metrics = self.metrics;
        Ok(monitor_loop)
    }
}

impl Default for MonitorLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
