//! Carbon-aware scheduler CLI
//!
//! Drives the scheduling core offline: submit job files to the priority
//! scheduler, plan carbon-aware placements and forecast resource usage.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{carbon, load_jobs, predict, schedule};
use scheduler_lib::ResourceUsage;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Carbon-aware scheduler CLI
#[derive(Parser)]
#[command(name = "gsched")]
#[command(author, version, about = "CLI for the carbon-aware scheduling core", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit jobs to the priority scheduler
    Schedule {
        /// JSON file with job descriptors
        #[arg(long, short)]
        jobs: PathBuf,

        /// CPU usage (percent) to admit against; samples the simulated monitor when no usage is given
        #[arg(long)]
        cpu: Option<f64>,

        /// Memory usage (percent) to admit against
        #[arg(long)]
        memory: Option<f64>,

        /// GPU usage (percent) to admit against
        #[arg(long)]
        gpu: Option<f64>,

        /// Multiplier on simulated execution time (0 runs instantly)
        #[arg(long, env = "GSCHED_TIME_SCALE", default_value_t = 1.0)]
        time_scale: f64,

        /// Seed for the simulated resource probe
        #[arg(long, env = "GSCHED_SEED")]
        seed: Option<u64>,
    },

    /// Place jobs into low-carbon hours
    Carbon {
        /// JSON file with job descriptors
        #[arg(long, short)]
        jobs: PathBuf,

        /// Seed for the simulated grid forecast
        #[arg(long, env = "GSCHED_SEED")]
        seed: Option<u64>,
    },

    /// Sample resources and forecast usage
    Predict {
        /// Number of samples to take before predicting
        #[arg(long, default_value_t = 20)]
        samples: usize,

        /// Forecast horizon in minutes
        #[arg(long, default_value_t = 60)]
        horizon: u32,

        /// Seed for the simulated resource probe
        #[arg(long, env = "GSCHED_SEED")]
        seed: Option<u64>,

        /// Report simulated GPU usage
        #[arg(long)]
        gpu: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Schedule {
            jobs,
            cpu,
            memory,
            gpu,
            time_scale,
            seed,
        } => {
            let jobs = load_jobs(&jobs)?;
            let usage = if cpu.is_some() || memory.is_some() || gpu.is_some() {
                Some(ResourceUsage {
                    cpu: cpu.unwrap_or(0.0),
                    memory: memory.unwrap_or(0.0),
                    gpu: gpu.unwrap_or(0.0),
                })
            } else {
                None
            };
            let options = schedule::ScheduleOptions {
                usage,
                time_scale,
                seed,
            };
            schedule::run(jobs, options, cli.format).await?;
        }
        Commands::Carbon { jobs, seed } => {
            let jobs = load_jobs(&jobs)?;
            carbon::run(jobs, seed, cli.format).await?;
        }
        Commands::Predict {
            samples,
            horizon,
            seed,
            gpu,
        } => {
            predict::run(samples, horizon, seed, gpu, cli.format).await?;
        }
    }

    Ok(())
}
