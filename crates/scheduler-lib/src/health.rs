//! Health tracking for the scheduling components
//!
//! Each component reports a [`ComponentHealth`]. The predictor and the job
//! scheduler derive theirs from scheduler state through [`predictor_health`]
//! and [`queue_health`]; the monitor is driven by probe outcomes. The
//! registry folds them into liveness and readiness answers for the agent.

use crate::jobs::QueueStatus;
use crate::predictor::MIN_SAMPLES;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, with reduced quality
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

/// Last reported state of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            checked_at: Utc::now(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Predictor health from the number of samples in the monitor history
///
/// Degraded while the history is too short to produce a forecast.
pub fn predictor_health(samples: usize) -> ComponentHealth {
    if samples < MIN_SAMPLES {
        ComponentHealth::degraded(format!(
            "collecting samples ({}/{})",
            samples, MIN_SAMPLES
        ))
    } else {
        ComponentHealth::healthy()
    }
}

/// Job scheduler health from the queue and the outcome of the last drain
///
/// Degraded when a job failed in the last drain or when the oldest queued
/// job has waited longer than `starvation_threshold`.
pub fn queue_health(
    status: &QueueStatus,
    failed_last_drain: usize,
    starvation_threshold: Duration,
) -> ComponentHealth {
    if failed_last_drain > 0 {
        return ComponentHealth::degraded(format!(
            "{} job(s) failed in the last drain",
            failed_last_drain
        ));
    }
    match status.oldest_wait_secs {
        Some(wait) if wait > starvation_threshold.as_secs_f64() => {
            ComponentHealth::degraded(format!(
                "{} job(s) queued, oldest waiting {:.0}s",
                status.queued, wait
            ))
        }
        _ => ComponentHealth::healthy(),
    }
}

/// Liveness answer for `/healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components; healthy when none are registered
    pub fn compute_status(components: &BTreeMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Readiness answer for `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Components serving with reduced quality
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

/// Component names for health tracking
pub mod components {
    pub const MONITOR: &str = "monitor";
    pub const PREDICTOR: &str = "predictor";
    pub const JOB_SCHEDULER: &str = "job_scheduler";
    pub const CARBON_SCHEDULER: &str = "carbon_scheduler";

    pub const ALL: [&str; 4] = [MONITOR, PREDICTOR, JOB_SCHEDULER, CARBON_SCHEDULER];
}

#[derive(Debug, Default)]
struct RegistryState {
    components: BTreeMap<String, ComponentHealth>,
    ready: bool,
}

/// Shared, cloneable registry of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    /// Register every scheduling component as healthy
    pub async fn register_all(&self) {
        let mut state = self.state.write().await;
        for name in components::ALL {
            state
                .components
                .insert(name.to_string(), ComponentHealth::healthy());
        }
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        self.state
            .write()
            .await
            .components
            .insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.ready = ready;
    }

    pub async fn status_of(&self, name: &str) -> Option<ComponentStatus> {
        self.state.read().await.components.get(name).map(|c| c.status)
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.state.read().await.components.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Ready once initialized and while no component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        let names_with = |status: ComponentStatus| -> Vec<String> {
            state
                .components
                .iter()
                .filter(|(_, c)| c.status == status)
                .map(|(name, _)| name.clone())
                .collect()
        };

        let degraded = names_with(ComponentStatus::Degraded);
        let unhealthy = names_with(ComponentStatus::Unhealthy);

        let reason = if !state.ready {
            Some("scheduler not yet initialized".to_string())
        } else if !unhealthy.is_empty() {
            Some(format!("unhealthy: {}", unhealthy.join(", ")))
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
            degraded,
        }
    }
}
