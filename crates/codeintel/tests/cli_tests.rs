//! CLI integration tests.
//!
//! These tests run the built binary end-to-end.

use std::process::Command;

fn codeintel() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_codeintel"));
    command.env_remove("CODEINTEL_CONFIG_CONTENT");
    command
}

#[test]
fn test_version_command() {
    let output = codeintel()
        .arg("version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("codeintel"));
}

#[test]
fn test_help_command() {
    let output = codeintel()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("complete"));
    assert!(stdout.contains("definition"));
    assert!(stdout.contains("--verbose"));
}

#[test]
fn test_config_command_shows_project_config() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(
        temp_dir.path().join("codeintel.jsonc"),
        "{\n  // status line tips\n  \"tooltips\": \"status\"\n}",
    )
    .expect("Failed to write config");

    let output = codeintel()
        .arg("config")
        .arg("--project")
        .arg(temp_dir.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration sources:"));
    assert!(stdout.contains("codeintel.jsonc"));
    assert!(stdout.contains("\"tooltips\": \"status\""));
}

#[test]
fn test_config_command_reads_environment() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let output = codeintel()
        .args(["config", "--project"])
        .arg(temp_dir.path())
        .env("CODEINTEL_CONFIG_CONTENT", r#"{ "historySize": 5 }"#)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"historySize\": 5"));
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(temp_dir.path().join("codeintel.json"), "{ not json")
        .expect("Failed to write config");

    let output = codeintel()
        .args(["config", "--project"])
        .arg(temp_dir.path())
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("codeintel.json"));
}

#[test]
fn test_complete_without_engine_fails() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file = temp_dir.path().join("app.py");
    std::fs::write(&file, "import os\nos.").expect("Failed to write file");

    let output = codeintel()
        .arg("complete")
        .arg(&file)
        .args(["--line", "2", "--col", "4", "--project"])
        .arg(temp_dir.path())
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No engine configured"));
}

#[test]
fn test_position_outside_file_fails() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file = temp_dir.path().join("app.py");
    std::fs::write(&file, "x").expect("Failed to write file");

    let output = codeintel()
        .arg("definition")
        .arg(&file)
        .args(["--line", "3", "--col", "1"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("outside"));
}
