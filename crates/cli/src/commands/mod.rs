//! CLI subcommands

pub mod carbon;
pub mod predict;
pub mod schedule;

use anyhow::{Context, Result};
use scheduler_lib::Job;
use serde::Deserialize;
use std::path::Path;

/// Job files hold either a bare array or `{"jobs": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum JobFile {
    List(Vec<Job>),
    Wrapped { jobs: Vec<Job> },
}

/// Read and validate job descriptors from a JSON file
pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    let jobs = match serde_json::from_str::<JobFile>(&content)
        .with_context(|| format!("Failed to parse job file {}", path.display()))?
    {
        JobFile::List(jobs) | JobFile::Wrapped { jobs } => jobs,
    };

    for job in &jobs {
        job.validate()?;
    }
    Ok(jobs)
}
