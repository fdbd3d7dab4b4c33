//! Sample resources and forecast usage

use anyhow::Result;
use scheduler_lib::{monitor::SimulatedProbe, Orchestrator, PredictionOutcome, ResourceMonitor};
use serde::Serialize;
use std::sync::Arc;
use tabled::Tabled;

use crate::output::{
    color_confidence, format_percent, print_info, print_json, print_rows, print_success,
    print_warning, OutputFormat,
};

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Resource")]
    resource: &'static str,
    #[tabled(rename = "Predicted")]
    predicted: String,
}

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Urgency")]
    urgency: String,
    #[tabled(rename = "Suggestion")]
    suggestion: String,
}

/// Serialized name of a unit enum variant
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Take `samples` simulated readings, then predict `horizon` minutes ahead
pub async fn run(
    samples: usize,
    horizon: u32,
    seed: Option<u64>,
    gpu: bool,
    format: OutputFormat,
) -> Result<()> {
    let probe = match seed {
        Some(seed) => SimulatedProbe::seeded(seed, gpu),
        None => SimulatedProbe::new(gpu),
    };
    let orchestrator = Orchestrator::builder()
        .monitor(Arc::new(ResourceMonitor::new(Arc::new(probe))))
        .build()?;

    for _ in 0..samples {
        orchestrator.monitor_resources().await;
    }

    let outcome = orchestrator.predict_resource_needs(horizon).await;

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Table => match outcome {
            PredictionOutcome::InsufficientData { samples, required } => {
                print_warning(&format!(
                    "Insufficient data: {} sample(s), {} required",
                    samples, required
                ));
            }
            PredictionOutcome::Available(prediction) => {
                print_info(&format!(
                    "Forecast {} minutes ahead, confidence {}",
                    prediction.time_horizon_minutes,
                    color_confidence(prediction.confidence)
                ));
                let usage = prediction.predicted_usage;
                print_rows(
                    vec![
                        UsageRow { resource: "CPU", predicted: format_percent(usage.cpu_usage) },
                        UsageRow { resource: "Memory", predicted: format_percent(usage.memory_usage) },
                        UsageRow { resource: "GPU", predicted: format_percent(usage.gpu_usage) },
                        UsageRow { resource: "Storage", predicted: format_percent(usage.storage_usage) },
                    ],
                    "",
                );

                println!();
                if prediction.recommendations.is_empty() {
                    print_success("No scaling action recommended");
                } else {
                    let rows: Vec<RecommendationRow> = prediction
                        .recommendations
                        .iter()
                        .map(|r| RecommendationRow {
                            resource: label(&r.resource),
                            action: label(&r.action),
                            urgency: label(&r.urgency),
                            suggestion: r.suggested_action.clone(),
                        })
                        .collect();
                    print_rows(rows, "");
                }
            }
        },
    }

    Ok(())
}
