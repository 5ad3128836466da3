//! CLI Integration Tests for deep-researcher
//!
//! Tests the command-line interface: help, the init command, the config
//! command and argument validation for the run command.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Run the built binary with arguments
fn run_researcher(args: &[&str], working_dir: Option<&std::path::Path>) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_deep-researcher"));
    cmd.args(args).arg("--no-color").env_remove("RUST_LOG");

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    cmd.output().expect("Failed to execute command")
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_researcher(&["--help"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("init"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_version_command() {
    let output = run_researcher(&["--version"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Init Command Tests
// =============================================================================

#[test]
fn test_init_creates_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = run_researcher(&["init"], Some(temp_dir.path()));

    assert!(output.status.success(), "{:?}", output);
    let config = fs::read_to_string(temp_dir.path().join("researcher.toml")).unwrap();
    assert!(config.contains("[workflow]"));
    assert!(config.contains("type = \"ollama\""));
    assert!(temp_dir.path().join(".env.example").exists());
}

#[test]
fn test_init_openai_provider() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = run_researcher(&["init", "--provider", "openai"], Some(temp_dir.path()));

    assert!(output.status.success());
    let config = fs::read_to_string(temp_dir.path().join("researcher.toml")).unwrap();
    assert!(config.contains("api_key_env = \"OPENAI_API_KEY\""));
}

#[test]
fn test_init_keeps_existing_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("researcher.toml"), "# mine").unwrap();

    let output = run_researcher(&["init"], Some(temp_dir.path()));

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"));
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("researcher.toml")).unwrap(),
        "# mine"
    );
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_validate() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(run_researcher(&["init"], Some(temp_dir.path())).status.success());

    let output = run_researcher(&["config", "--validate"], Some(temp_dir.path()));

    assert!(output.status.success(), "{:?}", output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("plan_schema"));
    assert!(stderr.contains("Configuration is valid"));
}

#[test]
fn test_config_missing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = run_researcher(&["config"], Some(temp_dir.path()));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("deep-researcher init"));
}

#[test]
fn test_config_rejects_unknown_model() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(run_researcher(&["init"], Some(temp_dir.path())).status.success());

    let path = temp_dir.path().join("researcher.toml");
    let config = fs::read_to_string(&path)
        .unwrap()
        .replace("plan_schema = \"strict\"", "plan_schema = \"missing\"");
    fs::write(&path, config).unwrap();

    let output = run_researcher(&["config", "--validate"], Some(temp_dir.path()));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing"));
}

// =============================================================================
// Run Command Tests
// =============================================================================

#[test]
fn test_run_requires_outline() {
    let output = run_researcher(&["run", "--topic", "Fusion power"], None);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--outline"));
}

#[test]
fn test_run_outline_sources_conflict() {
    let output = run_researcher(
        &[
            "run",
            "--topic",
            "Fusion power",
            "--outline",
            "History",
            "--outline-file",
            "outline.md",
        ],
        None,
    );

    assert!(!output.status.success());
}

#[test]
fn test_run_without_config_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = run_researcher(
        &["run", "--topic", "Fusion power", "--outline", "History"],
        Some(temp_dir.path()),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("researcher.toml"));
}
