//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table, or a notice when there are none
pub fn print_rows<T: Tabled>(rows: Vec<T>, empty_message: &str) {
    if rows.is_empty() {
        print_warning(empty_message);
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a utilization percentage
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a kilogram CO2 figure
pub fn format_kg_co2(value: f64) -> String {
    format!("{:.3} kg", value)
}

/// Format an hourly window as `HH:00-HH:00`
pub fn format_window(start_hour: u32, end_hour: u32) -> String {
    format!("{:02}:00-{:02}:00", start_hour, end_hour % 24)
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "completed" | "healthy" | "renewable" => status.green().to_string(),
        "queued" | "degraded" | "mixed" => status.yellow().to_string(),
        "failed" | "unhealthy" | "unscheduled" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a carbon intensity (gCO2/kWh) against the green threshold
pub fn color_intensity(intensity: f64, green_threshold: f64) -> String {
    let formatted = format!("{:.0}", intensity);
    if intensity < green_threshold * 0.75 {
        formatted.green().to_string()
    } else if intensity < green_threshold {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format!("{:.0}%", confidence * 100.0);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
