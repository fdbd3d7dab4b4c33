//! Threshold-driven capacity recommendations
//!
//! Turns a projected utilization into zero or more recommendations for the
//! orchestration layer. Thresholds are fixed defaults and can be overridden.

use super::PredictedUsage;
use serde::{Deserialize, Serialize};

/// Recommended capacity action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    ScaleUp,
    ScaleDown,
    Optimize,
}

/// How soon the recommendation should be acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationUrgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Resource a recommendation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "Memory")]
    Memory,
    #[serde(rename = "GPU")]
    Gpu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub resource: ResourceKind,
    pub action: RecommendedAction,
    pub urgency: RecommendationUrgency,
    pub description: String,
    pub suggested_action: String,
}

/// Thresholds (percent) that trigger recommendations
#[derive(Debug, Clone)]
pub struct RecommendationThresholds {
    pub cpu_scale_up: f64,
    pub cpu_scale_down: f64,
    pub memory_scale_up: f64,
    pub gpu_optimize: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            cpu_scale_up: 85.0,
            cpu_scale_down: 30.0,
            memory_scale_up: 90.0,
            gpu_optimize: 80.0,
        }
    }
}

/// Builds recommendations from projected usage
pub struct RecommendationEngine {
    thresholds: RecommendationThresholds,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self {
            thresholds: RecommendationThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: RecommendationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn recommend(&self, usage: &PredictedUsage) -> Vec<Recommendation> {
        let t = &self.thresholds;
        let mut recommendations = Vec::new();

        if usage.cpu_usage > t.cpu_scale_up {
            recommendations.push(Recommendation {
                resource: ResourceKind::Cpu,
                action: RecommendedAction::ScaleUp,
                urgency: RecommendationUrgency::High,
                description: format!("CPU usage predicted to exceed {}%", t.cpu_scale_up),
                suggested_action: "Add 2 more CPU cores or scale horizontally".to_string(),
            });
        } else if usage.cpu_usage < t.cpu_scale_down {
            recommendations.push(Recommendation {
                resource: ResourceKind::Cpu,
                action: RecommendedAction::ScaleDown,
                urgency: RecommendationUrgency::Low,
                description: format!("CPU usage predicted to be below {}%", t.cpu_scale_down),
                suggested_action: "Consider reducing CPU allocation".to_string(),
            });
        }

        if usage.memory_usage > t.memory_scale_up {
            recommendations.push(Recommendation {
                resource: ResourceKind::Memory,
                action: RecommendedAction::ScaleUp,
                urgency: RecommendationUrgency::Critical,
                description: format!("Memory usage predicted to exceed {}%", t.memory_scale_up),
                suggested_action: "Increase memory allocation immediately".to_string(),
            });
        }

        if usage.gpu_usage > t.gpu_optimize {
            recommendations.push(Recommendation {
                resource: ResourceKind::Gpu,
                action: RecommendedAction::Optimize,
                urgency: RecommendationUrgency::Medium,
                description: "GPU usage predicted to be high".to_string(),
                suggested_action: "Enable model quantization or batch optimization".to_string(),
            });
        }

        recommendations
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}
