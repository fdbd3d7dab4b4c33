//! Short-horizon resource forecasting
//!
//! [`ResourcePredictor`] reads the shared [`ResourceMonitor`] history,
//! extrapolates the recent linear trend and emits threshold-based
//! recommendations. The confidence score is a heuristic and advisory only.

mod features;
mod recommendations;

pub use features::{
    mean_trend, variance, FeatureExtractor, FeatureVector, MIN_SAMPLES, NUM_FEATURES,
    TREND_WINDOW,
};
pub use recommendations::{
    Recommendation, RecommendationEngine, RecommendationThresholds, RecommendationUrgency,
    RecommendedAction, ResourceKind,
};

use crate::monitor::ResourceMonitor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Minutes represented by one trend step
pub const TREND_UNIT_MINUTES: f64 = 30.0;

/// History length below which confidence stays flat
pub const CONFIDENCE_MIN_HISTORY: usize = 50;

/// Number of recent CPU samples used for the confidence variance
pub const CONFIDENCE_WINDOW: usize = 20;

/// Projected utilization, each value clamped to [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedUsage {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub gpu_usage: f64,
    pub storage_usage: f64,
}

impl PredictedUsage {
    fn from_features(features: &FeatureVector) -> Self {
        let pct = |v: f64| (v * 100.0).clamp(0.0, 100.0);
        Self {
            cpu_usage: pct(features.cpu),
            memory_usage: pct(features.memory),
            gpu_usage: pct(features.gpu),
            storage_usage: pct(features.storage),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub time_horizon_minutes: u32,
    pub predicted_usage: PredictedUsage,
    pub recommendations: Vec<Recommendation>,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

/// Outcome of a prediction request
///
/// Too little history is an expected state early in the process lifetime,
/// not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Available(Prediction),
    InsufficientData { samples: usize, required: usize },
}

impl PredictionOutcome {
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            PredictionOutcome::Available(p) => Some(p),
            PredictionOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.prediction().is_some()
    }
}

/// Forecasts resource needs from the monitor history
pub struct ResourcePredictor {
    monitor: Arc<ResourceMonitor>,
    extractor: FeatureExtractor,
    engine: RecommendationEngine,
}

impl ResourcePredictor {
    pub fn new(monitor: Arc<ResourceMonitor>) -> Self {
        Self {
            monitor,
            extractor: FeatureExtractor::default(),
            engine: RecommendationEngine::default(),
        }
    }

    pub fn with_thresholds(monitor: Arc<ResourceMonitor>, thresholds: RecommendationThresholds) -> Self {
        Self {
            monitor,
            extractor: FeatureExtractor::default(),
            engine: RecommendationEngine::with_thresholds(thresholds),
        }
    }

    /// Forecast utilization `horizon_minutes` ahead
    pub async fn predict(&self, horizon_minutes: u32) -> PredictionOutcome {
        let total = self.monitor.len().await;
        if total < MIN_SAMPLES {
            debug!(samples = total, required = MIN_SAMPLES, "Insufficient history for prediction");
            return PredictionOutcome::InsufficientData {
                samples: total,
                required: MIN_SAMPLES,
            };
        }

        let window = self.monitor.history(CONFIDENCE_WINDOW.max(MIN_SAMPLES)).await;
        let features = match self.extractor.extract(&window) {
            Some(f) => f,
            None => {
                return PredictionOutcome::InsufficientData {
                    samples: window.len(),
                    required: MIN_SAMPLES,
                }
            }
        };

        let predicted_usage = project(&features, horizon_minutes);
        let recommendations = self.engine.recommend(&predicted_usage);
        let confidence = confidence(total, &window);

        debug!(
            horizon_minutes,
            cpu = predicted_usage.cpu_usage,
            memory = predicted_usage.memory_usage,
            recommendations = recommendations.len(),
            confidence,
            "Prediction generated"
        );

        PredictionOutcome::Available(Prediction {
            time_horizon_minutes: horizon_minutes,
            predicted_usage,
            recommendations,
            confidence,
            generated_at: Utc::now(),
        })
    }
}

/// Linear trend projection from the latest feature vector
pub fn project(features: &[FeatureVector], horizon_minutes: u32) -> PredictedUsage {
    let Some(current) = features.last() else {
        return PredictedUsage::from_features(&FeatureVector::from_array([0.0; NUM_FEATURES]));
    };
    let trend = mean_trend(features);
    let steps = horizon_minutes as f64 / TREND_UNIT_MINUTES;
    PredictedUsage::from_features(&current.project(&trend, steps))
}

/// Heuristic confidence from history length and recent CPU variance
///
/// `recent` must be the most recent samples, newest last.
pub fn confidence(history_len: usize, recent: &[crate::models::ResourceSample]) -> f64 {
    if history_len < CONFIDENCE_MIN_HISTORY {
        return 0.6;
    }
    let skip = recent.len().saturating_sub(CONFIDENCE_WINDOW);
    let cpu: Vec<f64> = recent[skip..].iter().map(|s| s.cpu_usage).collect();
    (1.0 - variance(&cpu) / 1000.0).clamp(0.5, 0.95)
}
