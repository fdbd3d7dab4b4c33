//! Core data models for the scheduling core

use crate::error::SchedulerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Point-in-time resource utilization snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub gpu_usage: f64,
    pub storage_usage: f64,
    pub network_io: u64,
    pub timestamp: DateTime<Utc>,
}

impl ResourceSample {
    /// Zero-valued sample used when the probe is unavailable
    pub fn zeroed(timestamp: DateTime<Utc>) -> Self {
        Self {
            cpu_usage: 0.0,
            memory_usage: 0.0,
            gpu_usage: 0.0,
            storage_usage: 0.0,
            network_io: 0,
            timestamp,
        }
    }
}

/// Raw reading returned by a resource probe, before it is timestamped
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceReading {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub gpu_usage: f64,
    pub storage_usage: f64,
    pub network_io: u64,
}

impl ResourceReading {
    pub fn stamp(self, timestamp: DateTime<Utc>) -> ResourceSample {
        ResourceSample {
            cpu_usage: self.cpu_usage,
            memory_usage: self.memory_usage,
            gpu_usage: self.gpu_usage,
            storage_usage: self.storage_usage,
            network_io: self.network_io,
            timestamp,
        }
    }
}

/// Kind of workload a job represents
///
/// Unknown type strings are kept as [`JobType::Other`] rather than rejected,
/// so new workload kinds can be submitted before they get their own tuning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    Training,
    Inference,
    BatchProcessing,
    ModelOptimization,
    Other(String),
}

impl JobType {
    pub fn as_str(&self) -> &str {
        match self {
            JobType::Training => "training",
            JobType::Inference => "inference",
            JobType::BatchProcessing => "batch_processing",
            JobType::ModelOptimization => "model_optimization",
            JobType::Other(name) => name,
        }
    }
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Inference
    }
}

impl From<String> for JobType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "training" => JobType::Training,
            "inference" => JobType::Inference,
            "batch_processing" => JobType::BatchProcessing,
            "model_optimization" => JobType::ModelOptimization,
            _ => JobType::Other(value),
        }
    }
}

impl From<&str> for JobType {
    fn from(value: &str) -> Self {
        JobType::from(value.to_string())
    }
}

impl From<JobType> for String {
    fn from(value: JobType) -> Self {
        match value {
            JobType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-declared urgency of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "critical",
            Urgency::High => "high",
            Urgency::Normal => "normal",
            Urgency::Low => "low",
        }
    }
}

impl FromStr for Urgency {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Urgency::Critical),
            "high" => Ok(Urgency::High),
            "normal" => Ok(Urgency::Normal),
            "low" => Ok(Urgency::Low),
            other => Err(SchedulerError::InvalidJob(format!(
                "unknown urgency '{}', expected one of critical, high, normal, low",
                other
            ))),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory carbon preference echoed back in carbon schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarbonPriority {
    High,
    #[default]
    Normal,
}

/// Job descriptor supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default = "generate_job_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default = "default_resource_weight")]
    pub resource_weight: f64,
    #[serde(default = "default_duration_hours")]
    pub estimated_duration_hours: f64,
    #[serde(default)]
    pub carbon_priority: CarbonPriority,
}

fn generate_job_id() -> String {
    format!("job-{}", uuid::Uuid::new_v4())
}

fn default_resource_weight() -> f64 {
    1.0
}

fn default_duration_hours() -> f64 {
    1.0
}

impl Job {
    pub fn new(id: impl Into<String>, job_type: impl Into<JobType>) -> Self {
        Self {
            id: id.into(),
            job_type: job_type.into(),
            urgency: Urgency::default(),
            resource_weight: default_resource_weight(),
            estimated_duration_hours: default_duration_hours(),
            carbon_priority: CarbonPriority::default(),
        }
    }

    /// Create a job with a generated identifier
    pub fn anonymous(job_type: impl Into<JobType>) -> Self {
        Self::new(generate_job_id(), job_type)
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_resource_weight(mut self, weight: f64) -> Self {
        self.resource_weight = weight;
        self
    }

    pub fn with_duration_hours(mut self, hours: f64) -> Self {
        self.estimated_duration_hours = hours;
        self
    }

    pub fn with_carbon_priority(mut self, priority: CarbonPriority) -> Self {
        self.carbon_priority = priority;
        self
    }

    /// Reject descriptors that cannot be scheduled meaningfully
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.id.trim().is_empty() {
            return Err(SchedulerError::InvalidJob("job id must not be empty".into()));
        }
        if self.job_type.as_str().trim().is_empty() {
            return Err(SchedulerError::InvalidJob(format!(
                "job '{}' has an empty type",
                self.id
            )));
        }
        if !self.resource_weight.is_finite() || self.resource_weight <= 0.0 {
            return Err(SchedulerError::InvalidJob(format!(
                "job '{}' has invalid resource_weight {}, must be a positive number",
                self.id, self.resource_weight
            )));
        }
        if !self.estimated_duration_hours.is_finite() || self.estimated_duration_hours <= 0.0 {
            return Err(SchedulerError::InvalidJob(format!(
                "job '{}' has invalid estimated_duration_hours {}, must be a positive number",
                self.id, self.estimated_duration_hours
            )));
        }
        Ok(())
    }
}

/// Tracked resource usage used for admission control (percentages)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu: f64,
    pub memory: f64,
    pub gpu: f64,
}

impl From<&ResourceSample> for ResourceUsage {
    fn from(sample: &ResourceSample) -> Self {
        Self {
            cpu: sample.cpu_usage,
            memory: sample.memory_usage,
            gpu: sample.gpu_usage,
        }
    }
}
