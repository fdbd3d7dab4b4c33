//! CLI integration tests

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn gsched(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gsched"))
        .args(args)
        .env_remove("GSCHED_SEED")
        .env_remove("GSCHED_TIME_SCALE")
        .output()
        .expect("Failed to execute command")
}

fn job_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn json_output(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

const MIXED_JOBS: &str = r#"[
    {"id": "a", "type": "inference", "urgency": "critical"},
    {"id": "b", "type": "training", "urgency": "low"},
    {"id": "c", "type": "inference"}
]"#;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = gsched(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("schedule"), "Should show schedule command");
    assert!(stdout.contains("carbon"), "Should show carbon command");
    assert!(stdout.contains("predict"), "Should show predict command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = gsched(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("gsched"), "Should show binary name");
}

#[test]
fn test_schedule_with_headroom_runs_every_job() {
    let jobs = job_file(MIXED_JOBS);
    let path = jobs.path().to_str().unwrap();
    let output = gsched(&[
        "schedule", "--jobs", path, "--cpu", "10", "--time-scale", "0", "--format", "json",
    ]);

    let report = json_output(&output);
    let submissions = report["submissions"].as_array().unwrap();
    assert_eq!(submissions.len(), 3);
    assert_eq!(submissions[0]["priority"], 80);
    assert_eq!(submissions[1]["priority"], 165);
    assert_eq!(submissions[2]["priority"], 110);
    assert!(report["still_queued"].as_array().unwrap().is_empty());
}

#[test]
fn test_schedule_under_pressure_leaves_jobs_queued() {
    let jobs = job_file(MIXED_JOBS);
    let path = jobs.path().to_str().unwrap();
    let output = gsched(&[
        "schedule", "--jobs", path, "--cpu", "80", "--time-scale", "0", "--format", "json",
    ]);

    let report = json_output(&output);
    let queued: Vec<&str> = report["still_queued"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(queued, vec!["a", "c", "b"]);
}

#[test]
fn test_schedule_table_output() {
    let jobs = job_file(MIXED_JOBS);
    let path = jobs.path().to_str().unwrap();
    let output = gsched(&["schedule", "--jobs", path, "--gpu", "95", "--time-scale", "0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Priority"));
    assert!(stdout.contains("still queued"));
}

#[test]
fn test_schedule_reads_seed_from_environment() {
    let help = gsched(&["schedule", "--help"]);
    assert!(String::from_utf8_lossy(&help.stdout).contains("GSCHED_SEED"));

    let jobs = job_file(MIXED_JOBS);
    let output = Command::new(env!("CARGO_BIN_EXE_gsched"))
        .args(["schedule", "--jobs", jobs.path().to_str().unwrap(), "--time-scale", "0"])
        .env("GSCHED_SEED", "not-a-number")
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success(), "Malformed GSCHED_SEED should be rejected");

    let output = Command::new(env!("CARGO_BIN_EXE_gsched"))
        .args(["schedule", "--jobs", jobs.path().to_str().unwrap(), "--time-scale", "0"])
        .args(["--format", "json"])
        .env("GSCHED_SEED", "11")
        .output()
        .expect("Failed to execute command");
    let report = json_output(&output);
    assert_eq!(report["submissions"].as_array().unwrap().len(), 3);
}

#[test]
fn test_schedule_rejects_invalid_job() {
    let jobs = job_file(r#"[{"id": "x", "estimated_duration_hours": 0}]"#);
    let output = gsched(&["schedule", "--jobs", jobs.path().to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("estimated_duration_hours"));
}

#[test]
fn test_schedule_missing_file() {
    let output = gsched(&["schedule", "--jobs", "/nonexistent/jobs.json"]);
    assert!(!output.status.success());
}

#[test]
fn test_carbon_schedule_json() {
    let jobs = job_file(
        r#"{"jobs": [
            {"id": "t1", "type": "training", "estimated_duration_hours": 4, "carbon_priority": "high"},
            {"id": "t2", "type": "training", "estimated_duration_hours": 2}
        ]}"#,
    );
    let output = gsched(&[
        "carbon", "--jobs", jobs.path().to_str().unwrap(), "--seed", "7", "--format", "json",
    ]);

    let result = json_output(&output);
    let scheduled = result["scheduled_jobs"].as_array().unwrap();
    assert_eq!(scheduled.len(), 2);
    assert_eq!(scheduled[0]["job_id"], "t1");
    assert_eq!(scheduled[0]["carbon_priority"], "high");
    assert!(scheduled[0]["carbon_intensity"].as_f64().unwrap() < 350.0);
    assert!(result["carbon_savings"]["total_savings_kg_co2"].as_f64().unwrap() >= 0.0);
    assert_eq!(result["carbon_savings"]["jobs_scheduled"], 2);
}

#[test]
fn test_carbon_schedule_reports_overflow() {
    // Nine green hours of capacity 10 each cannot hold ten 10-hour jobs
    let jobs: Vec<String> = (0..10)
        .map(|i| format!(r#"{{"id": "long{}", "estimated_duration_hours": 10}}"#, i))
        .collect();
    let jobs = job_file(&format!("[{}]", jobs.join(",")));
    let output = gsched(&[
        "carbon", "--jobs", jobs.path().to_str().unwrap(), "--seed", "3", "--format", "json",
    ]);

    let result = json_output(&output);
    assert_eq!(result["scheduled_jobs"].as_array().unwrap().len(), 9);
    assert_eq!(result["unscheduled_jobs"].as_array().unwrap().len(), 1);
    assert_eq!(result["unscheduled_jobs"][0]["job_id"], "long9");
}

#[test]
fn test_predict_needs_ten_samples() {
    let output = gsched(&["predict", "--samples", "9", "--seed", "1", "--format", "json"]);
    let outcome = json_output(&output);
    assert_eq!(outcome["status"], "insufficient_data");
    assert_eq!(outcome["samples"], 9);

    let output = gsched(&[
        "predict", "--samples", "10", "--horizon", "30", "--seed", "1", "--format", "json",
    ]);
    let outcome = json_output(&output);
    assert_eq!(outcome["status"], "available");
    assert_eq!(outcome["time_horizon_minutes"], 30);
}

#[test]
fn test_predict_table_output() {
    let output = gsched(&["predict", "--samples", "15", "--seed", "2", "--gpu"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Forecast 60 minutes ahead"));
    assert!(stdout.contains("GPU"));
}

#[test]
fn test_format_option() {
    let output = gsched(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("--horizon"), "Should show horizon option");
}

#[test]
fn test_invalid_command() {
    let output = gsched(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_missing_argument() {
    let output = gsched(&["carbon"]);
    assert!(!output.status.success(), "Missing --jobs should fail");
}
