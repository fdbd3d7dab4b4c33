//! Carbon-aware placement of a job file

use anyhow::Result;
use scheduler_lib::{
    carbon::{CarbonConfig, SimulatedGridSource},
    monitor::SimulatedProbe,
    Job, Orchestrator, ResourceMonitor,
};
use std::sync::Arc;
use tabled::Tabled;

use crate::output::{
    color_intensity, color_status, format_kg_co2, format_percent, format_window, print_info,
    print_json, print_rows, print_success, print_warning, OutputFormat,
};

#[derive(Tabled)]
struct PlacementRow {
    #[tabled(rename = "Job")]
    job_id: String,
    #[tabled(rename = "Window (UTC)")]
    window: String,
    #[tabled(rename = "gCO2/kWh")]
    intensity: String,
    #[tabled(rename = "Renewable")]
    renewable: String,
    #[tabled(rename = "Carbon Priority")]
    carbon_priority: String,
}

#[derive(Tabled)]
struct UnscheduledRow {
    #[tabled(rename = "Job")]
    job_id: String,
    #[tabled(rename = "Hours")]
    hours: f64,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Compute and print a carbon-optimal schedule
pub async fn run(jobs: Vec<Job>, seed: Option<u64>, format: OutputFormat) -> Result<()> {
    let source = match seed {
        Some(seed) => SimulatedGridSource::seeded(seed),
        None => SimulatedGridSource::new(),
    };
    let config = CarbonConfig::default();
    let orchestrator = Orchestrator::builder()
        .monitor(Arc::new(ResourceMonitor::new(Arc::new(SimulatedProbe::new(false)))))
        .intensity_source(Arc::new(source))
        .carbon_config(config)
        .build()?;

    let result = orchestrator.get_carbon_optimal_schedule(&jobs).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let current = &result.current_intensity;
            print_info(&format!(
                "Current intensity {} gCO2/kWh ({})",
                color_intensity(current.intensity_gco2_kwh, config.green_threshold),
                color_status(&current.source)
            ));
            println!();

            let rows: Vec<PlacementRow> = result
                .scheduled_jobs
                .iter()
                .map(|e| PlacementRow {
                    job_id: e.job_id.clone(),
                    window: format_window(e.scheduled_start, e.scheduled_end),
                    intensity: color_intensity(e.carbon_intensity, config.green_threshold),
                    renewable: format_percent(e.renewable_percentage),
                    carbon_priority: format!("{:?}", e.carbon_priority).to_lowercase(),
                })
                .collect();
            print_rows(rows, "No jobs placed in green windows");

            if !result.unscheduled_jobs.is_empty() {
                println!();
                print_warning(&format!(
                    "{} job(s) {}",
                    result.unscheduled_jobs.len(),
                    color_status("unscheduled")
                ));
                let rows: Vec<UnscheduledRow> = result
                    .unscheduled_jobs
                    .iter()
                    .map(|u| UnscheduledRow {
                        job_id: u.job_id.clone(),
                        hours: u.estimated_duration_hours,
                        reason: u.reason.clone(),
                    })
                    .collect();
                print_rows(rows, "");
            }

            let savings = &result.carbon_savings;
            println!();
            print_success(&format!(
                "Estimated savings {} ({} reduction) across {} job(s), {} green window(s)",
                format_kg_co2(savings.total_savings_kg_co2),
                format_percent(savings.percentage_reduction),
                savings.jobs_scheduled,
                result.green_windows.len()
            ));
        }
    }

    Ok(())
}
