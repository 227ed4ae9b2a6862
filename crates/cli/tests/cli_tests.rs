//! CLI integration tests

use std::process::{Command, Output};

fn pmd(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "pmd-cli", "--"])
        .args(args)
        // Nothing listens on the discard port; requests must never be needed
        .env("PMD_API_URL", "http://127.0.0.1:9")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = pmd(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Predictive Maintenance Dashboard"),
        "Should show app name"
    );
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("history"), "Should show history command");
    assert!(stdout.contains("export"), "Should show export command");
    assert!(stdout.contains("report"), "Should show report command");
    assert!(stdout.contains("session"), "Should show session command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = pmd(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("pmd"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = pmd(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in [
        "--machine-id",
        "--air-temp",
        "--process-temp",
        "--rpm",
        "--torque",
        "--breakdown-cost",
        "--failures-per-month",
    ] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test history subcommand help
#[test]
fn test_history_help() {
    let output = pmd(&["history", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "History help should succeed");
    assert!(stdout.contains("--machine"), "Should show machine filter");
    assert!(stdout.contains("--risk"), "Should show risk filter");
    assert!(stdout.contains("--date"), "Should show date filter");
    assert!(stdout.contains("--sort"), "Should show sort option");
    assert!(stdout.contains("--page"), "Should show page option");
}

/// Test export subcommand help
#[test]
fn test_export_help() {
    let output = pmd(&["export", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Export help should succeed");
    assert!(stdout.contains("--output"), "Should show output option");
    assert!(
        stdout.contains("prediction_history.csv"),
        "Should show default file name"
    );
}

/// Test report subcommand help
#[test]
fn test_report_help() {
    let output = pmd(&["report", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Report help should succeed");
    assert!(stdout.contains("--output"), "Should show output option");
    assert!(stdout.contains("--torque"), "Should accept readings");
}

/// Test format and api-url options
#[test]
fn test_global_options() {
    let output = pmd(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("PMD_API_URL"), "Should show env var");
    assert!(stdout.contains("--log-json"), "Should show log-json option");
}

/// A missing reading is rejected before anything is sent
#[test]
fn test_predict_missing_torque_fails_locally() {
    let output = pmd(&[
        "predict",
        "--air-temp",
        "300",
        "--process-temp",
        "310",
        "--rpm",
        "1500",
    ]);

    assert!(!output.status.success(), "Missing torque should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("torque is required and must be a number"),
        "Should name the missing field, got: {}",
        stderr
    );
    assert!(
        !stderr.contains("Could not reach"),
        "Should fail before any request"
    );
}

/// Non-numeric readings are rejected the same way
#[test]
fn test_predict_non_numeric_rpm_fails_locally() {
    let output = pmd(&[
        "predict",
        "--air-temp",
        "300",
        "--process-temp",
        "310",
        "--rpm",
        "fast",
        "--torque",
        "40",
    ]);

    assert!(!output.status.success(), "Non-numeric rpm should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rpm"), "Should name the bad field");
}

/// Bad filters are rejected before fetching
#[test]
fn test_history_invalid_sort() {
    let output = pmd(&["history", "--sort", "sideways"]);

    assert!(!output.status.success(), "Invalid sort should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown sort order"),
        "Should explain the sort error"
    );
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = pmd(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}
