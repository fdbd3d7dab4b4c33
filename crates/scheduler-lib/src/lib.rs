//! Carbon-aware workload scheduling core
//!
//! This crate provides:
//! - Resource sampling with a bounded rolling history
//! - Short-horizon usage prediction and scaling recommendations
//! - Priority job scheduling gated on resource headroom
//! - Placement of deferrable jobs into low-carbon hours
//! - Health checks and observability

pub mod carbon;
pub mod error;
pub mod health;
pub mod jobs;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod orchestrator;
pub mod predictor;

pub use carbon::{CarbonConfig, CarbonScheduleResult, CarbonWindowScheduler, IntensitySource};
pub use error::{SchedulerError, SchedulerResult};
pub use health::{
    predictor_health, queue_health, ComponentHealth, ComponentStatus, HealthRegistry,
    HealthResponse, ReadinessResponse,
};
pub use jobs::{PriorityJobScheduler, SchedulingResult};
pub use models::*;
pub use monitor::{ResourceMonitor, ResourceProbe};
pub use observability::{SchedulerMetrics, StructuredLogger};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use predictor::{Prediction, PredictionOutcome, ResourcePredictor};
