//! Agent configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Where resource readings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Synthetic readings
    Simulated,
    /// Host readings via sysinfo
    Host,
}

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Name reported in structured logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Resource sampling interval in seconds
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,

    /// Samples kept in the rolling history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Consecutive probe failures before the monitor turns unhealthy
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_probe")]
    pub probe: ProbeKind,

    /// Whether the simulated probe reports GPU usage
    #[serde(default)]
    pub gpu_available: bool,

    #[serde(default = "default_cpu_threshold")]
    pub cpu_threshold: f64,

    #[serde(default = "default_memory_threshold")]
    pub memory_threshold: f64,

    #[serde(default = "default_gpu_threshold")]
    pub gpu_threshold: f64,
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_sample_interval() -> u64 {
    30
}

fn default_history_capacity() -> usize {
    1000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_probe() -> ProbeKind {
    ProbeKind::Simulated
}

fn default_cpu_threshold() -> f64 {
    80.0
}

fn default_memory_threshold() -> f64 {
    85.0
}

fn default_gpu_threshold() -> f64 {
    90.0
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            api_port: default_api_port(),
            sample_interval_secs: default_sample_interval(),
            history_capacity: default_history_capacity(),
            failure_threshold: default_failure_threshold(),
            probe: default_probe(),
            gpu_available: false,
            cpu_threshold: default_cpu_threshold(),
            memory_threshold: default_memory_threshold(),
            gpu_threshold: default_gpu_threshold(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from `SCHEDULER_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("SCHEDULER").try_parsing(true))
    }

    /// Load configuration from an explicit source
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read scheduler configuration")?;

        let config: AgentConfig = config
            .try_deserialize()
            .context("Invalid scheduler configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_secs == 0 {
            anyhow::bail!("sample_interval_secs must be greater than zero");
        }
        if self.history_capacity == 0 {
            anyhow::bail!("history_capacity must be greater than zero");
        }
        for (name, value) in [
            ("cpu_threshold", self.cpu_threshold),
            ("memory_threshold", self.memory_threshold),
            ("gpu_threshold", self.gpu_threshold),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                anyhow::bail!("{} must be in (0, 100], got {}", name, value);
            }
        }
        Ok(())
    }
}
