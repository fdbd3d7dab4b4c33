//! Feature extraction for short-horizon resource forecasting
//!
//! Each sample becomes a 6-dimensional vector of normalized utilization and
//! temporal context. The trend is the mean first difference over the most
//! recent vectors.

use crate::models::ResourceSample;
use chrono::{Datelike, Timelike};

/// Minimum number of samples required before a forecast is produced
pub const MIN_SAMPLES: usize = 10;

/// Number of trailing samples used for trend estimation
pub const TREND_WINDOW: usize = 5;

/// Number of features per sample
pub const NUM_FEATURES: usize = 6;

/// Normalized per-sample features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub cpu: f64,
    pub memory: f64,
    pub gpu: f64,
    pub storage: f64,
    pub time_of_day: f64,
    pub day_of_week: f64,
}

impl FeatureVector {
    pub fn from_sample(sample: &ResourceSample) -> Self {
        let ts = sample.timestamp;
        Self {
            cpu: sample.cpu_usage / 100.0,
            memory: sample.memory_usage / 100.0,
            gpu: sample.gpu_usage / 100.0,
            storage: sample.storage_usage / 100.0,
            time_of_day: ts.num_seconds_from_midnight() as f64 / 86_400.0,
            day_of_week: ts.weekday().num_days_from_monday() as f64 / 7.0,
        }
    }

    pub fn as_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.cpu,
            self.memory,
            self.gpu,
            self.storage,
            self.time_of_day,
            self.day_of_week,
        ]
    }

    pub fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            cpu: values[0],
            memory: values[1],
            gpu: values[2],
            storage: values[3],
            time_of_day: values[4],
            day_of_week: values[5],
        }
    }

    /// Project `self + trend * steps`
    pub fn project(&self, trend: &FeatureVector, steps: f64) -> FeatureVector {
        let current = self.as_array();
        let delta = trend.as_array();
        let mut out = [0.0; NUM_FEATURES];
        for i in 0..NUM_FEATURES {
            out[i] = current[i] + delta[i] * steps;
        }
        FeatureVector::from_array(out)
    }
}

/// Extracts feature vectors from the monitor history
pub struct FeatureExtractor {
    window_size: usize,
}

impl FeatureExtractor {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn has_sufficient_data(&self, samples: &[ResourceSample]) -> bool {
        samples.len() >= MIN_SAMPLES
    }

    /// Feature vectors for the trailing window, oldest first
    pub fn extract(&self, samples: &[ResourceSample]) -> Option<Vec<FeatureVector>> {
        if !self.has_sufficient_data(samples) {
            return None;
        }
        let skip = samples.len().saturating_sub(self.window_size);
        Some(samples[skip..].iter().map(FeatureVector::from_sample).collect())
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(MIN_SAMPLES)
    }
}

/// Mean first difference over the last [`TREND_WINDOW`] vectors
///
/// Returns a zero trend when fewer than [`TREND_WINDOW`] vectors exist.
pub fn mean_trend(features: &[FeatureVector]) -> FeatureVector {
    if features.len() < TREND_WINDOW {
        return FeatureVector::from_array([0.0; NUM_FEATURES]);
    }

    let tail = &features[features.len() - TREND_WINDOW..];
    let mut sum = [0.0; NUM_FEATURES];
    for pair in tail.windows(2) {
        let prev = pair[0].as_array();
        let next = pair[1].as_array();
        for i in 0..NUM_FEATURES {
            sum[i] += next[i] - prev[i];
        }
    }

    let n = (TREND_WINDOW - 1) as f64;
    FeatureVector::from_array(sum.map(|v| v / n))
}

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn samples_with_cpu(values: &[f64]) -> Vec<ResourceSample> {
        // 2024-01-03 is a Wednesday
        let base = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, cpu)| ResourceSample {
                cpu_usage: *cpu,
                memory_usage: 50.0,
                gpu_usage: 20.0,
                storage_usage: 40.0,
                network_io: i as u64,
                timestamp: base + chrono::Duration::minutes(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_insufficient_samples() {
        let extractor = FeatureExtractor::default();
        let samples = samples_with_cpu(&[10.0; 9]);
        assert!(!extractor.has_sufficient_data(&samples));
        assert!(extractor.extract(&samples).is_none());
    }

    #[test]
    fn test_extract_uses_trailing_window() {
        let extractor = FeatureExtractor::default();
        let cpu: Vec<f64> = (0..15).map(|i| i as f64).collect();
        let features = extractor.extract(&samples_with_cpu(&cpu)).unwrap();
        assert_eq!(features.len(), MIN_SAMPLES);
        assert!((features[0].cpu - 0.05).abs() < 1e-12);
        assert!((features[9].cpu - 0.14).abs() < 1e-12);
    }

    #[test]
    fn test_feature_normalization() {
        let samples = samples_with_cpu(&[80.0]);
        let f = FeatureVector::from_sample(&samples[0]);
        assert!((f.cpu - 0.8).abs() < 1e-12);
        assert!((f.memory - 0.5).abs() < 1e-12);
        assert!((f.time_of_day - 0.5).abs() < 1e-12);
        assert!((f.day_of_week - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_trend_over_last_five() {
        let cpu = [0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        let features: Vec<_> = samples_with_cpu(&cpu)
            .iter()
            .map(FeatureVector::from_sample)
            .collect();
        let trend = mean_trend(&features);
        assert!((trend.cpu - 0.1).abs() < 1e-12);
        assert!(trend.memory.abs() < 1e-12);
    }

    #[test]
    fn test_mean_trend_short_input_is_zero() {
        let features: Vec<_> = samples_with_cpu(&[1.0, 2.0])
            .iter()
            .map(FeatureVector::from_sample)
            .collect();
        assert_eq!(mean_trend(&features).cpu, 0.0);
    }

    #[test]
    fn test_variance_calculation() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((variance(&values) - 4.0).abs() < 1e-12);
        assert_eq!(variance(&[]), 0.0);
    }
}
