//! Scheduler Agent - carbon-aware scheduling core as a long-running process
//!
//! Samples resource usage on a fixed interval and serves health, metrics,
//! the latest sample and usage forecasts over HTTP.

use anyhow::Result;
use scheduler_agent::{
    api,
    config::{AgentConfig, ProbeKind},
};
use scheduler_lib::{
    health::HealthRegistry,
    jobs::{JobSchedulerConfig, ResourceThresholds},
    monitor::{HostProbe, MonitorConfig, MonitorLoopBuilder, ResourceProbe, SimulatedProbe},
    observability::{SchedulerMetrics, StructuredLogger},
    Orchestrator, ResourceMonitor,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting scheduler-agent");

    let config = AgentConfig::load()?;
    info!(node_name = %config.node_name, probe = ?config.probe, "Agent configured");

    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let metrics = SchedulerMetrics::new();

    let probe: Arc<dyn ResourceProbe> = match config.probe {
        ProbeKind::Simulated => Arc::new(SimulatedProbe::new(config.gpu_available)),
        ProbeKind::Host => Arc::new(HostProbe::new()),
    };

    let logger = StructuredLogger::new(&config.node_name);
    logger.log_startup(AGENT_VERSION, probe.name());

    let monitor = Arc::new(ResourceMonitor::with_config(
        probe,
        MonitorConfig {
            history_capacity: config.history_capacity,
        },
    ));

    let orchestrator = Orchestrator::builder()
        .monitor(monitor.clone())
        .job_config(JobSchedulerConfig {
            thresholds: ResourceThresholds {
                cpu: config.cpu_threshold,
                memory: config.memory_threshold,
                gpu: config.gpu_threshold,
            },
            ..Default::default()
        })
        .health(health_registry.clone())
        .metrics(metrics.clone())
        .logger(logger.clone())
        .build()?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let monitor_loop = MonitorLoopBuilder::new()
        .monitor(monitor)
        .interval(Duration::from_secs(config.sample_interval_secs))
        .failure_threshold(config.failure_threshold)
        .health(health_registry.clone())
        .metrics(metrics.clone())
        .build()?;
    let monitor_handle = tokio::spawn(monitor_loop.run(shutdown_tx.subscribe()));

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        Arc::new(orchestrator),
    ));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    logger.log_shutdown("API server failed");
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    logger.log_shutdown("API server task panicked");
                }
            }
        }
    }

    health_registry.set_ready(false).await;
    let _ = shutdown_tx.send(());
    if let Err(e) = monitor_handle.await {
        error!(error = %e, "Monitor loop task failed");
    }
    info!("Shutting down");

    Ok(())
}
