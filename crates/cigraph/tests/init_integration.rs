//! Integration tests for the `init` command.
//!
//! These tests verify the end-to-end behavior of the init command,
//! including the CLI interface and file system operations.

use tempfile::TempDir;

mod common;
use common::{run_cigraph_in_dir, run_ok};

// ============================================================================
// Init Command Integration Tests
// ============================================================================

#[test]
fn test_init_creates_cigraph_directory() {
    let temp_dir = TempDir::new().unwrap();

    run_ok(temp_dir.path(), &["init", "--quiet"]);

    let cigraph_dir = temp_dir.path().join(".cigraph");
    assert!(cigraph_dir.is_dir(), ".cigraph should be a directory");
}

#[test]
fn test_init_creates_config_file() {
    let temp_dir = TempDir::new().unwrap();

    run_ok(temp_dir.path(), &["init", "--quiet"]);

    let content = std::fs::read_to_string(temp_dir.path().join(".cigraph/config.yaml")).unwrap();
    assert!(content.contains("backend: jsonl"), "config:\n{content}");
    assert!(content.contains("items-file: .cigraph/items.jsonl"));
    assert!(content.contains("relationships-file: .cigraph/relationships.jsonl"));
    assert!(content.contains("file: .cigraph/changes.jsonl"));
}

#[test]
fn test_init_creates_empty_data_files() {
    let temp_dir = TempDir::new().unwrap();

    run_ok(temp_dir.path(), &["init", "--quiet"]);

    for name in ["items.jsonl", "relationships.jsonl"] {
        let path = temp_dir.path().join(".cigraph").join(name);
        assert!(path.exists(), "{name} should exist");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}

#[test]
fn test_init_creates_gitignore() {
    let temp_dir = TempDir::new().unwrap();

    run_ok(temp_dir.path(), &["init", "--quiet"]);

    let content = std::fs::read_to_string(temp_dir.path().join(".cigraph/.gitignore")).unwrap();
    assert!(content.contains("changes.jsonl"));
    assert!(content.contains("*.tmp"));
}

#[test]
fn test_init_prints_summary() {
    let temp_dir = TempDir::new().unwrap();

    let stdout = run_ok(temp_dir.path(), &["init"]);

    assert!(stdout.contains("Initialized cigraph in"));
    assert!(stdout.contains("Relationships:"));
}

#[test]
fn test_init_quiet_prints_nothing() {
    let temp_dir = TempDir::new().unwrap();

    let stdout = run_ok(temp_dir.path(), &["init", "-q"]);

    assert!(stdout.is_empty());
}

#[test]
fn test_init_json_output() {
    let temp_dir = TempDir::new().unwrap();

    let stdout = run_ok(temp_dir.path(), &["--json", "init"]);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(json["cigraph_dir"].as_str().unwrap().ends_with(".cigraph"));
    assert!(json["items_file"].as_str().unwrap().ends_with("items.jsonl"));
}

#[test]
fn test_init_twice_fails() {
    let temp_dir = TempDir::new().unwrap();
    run_ok(temp_dir.path(), &["init", "--quiet"]);

    let output = run_cigraph_in_dir(temp_dir.path(), &["init"]);

    assert!(!output.status.success(), "Second init should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already initialized"), "stderr: {stderr}");
}

#[test]
fn test_init_then_commands_work() {
    let temp_dir = TempDir::new().unwrap();
    run_ok(temp_dir.path(), &["init", "--quiet"]);

    let stdout = run_ok(temp_dir.path(), &["items"]);
    assert!(stdout.contains("No configuration items found"));
}

#[test]
fn test_invalid_config_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    run_ok(temp_dir.path(), &["init", "--quiet"]);

    let config_path = temp_dir.path().join(".cigraph/config.yaml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    std::fs::write(&config_path, content.replace("backend: jsonl", "backend: postgres")).unwrap();

    let output = run_cigraph_in_dir(temp_dir.path(), &["items"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("postgres"), "stderr: {stderr}");
}

#[test]
fn test_memory_backend_does_not_persist() {
    let temp_dir = TempDir::new().unwrap();
    run_ok(temp_dir.path(), &["init", "--quiet"]);

    let config_path = temp_dir.path().join(".cigraph/config.yaml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    // Only the storage backend is the first "backend:" line
    std::fs::write(&config_path, content.replacen("backend: jsonl", "backend: memory", 1)).unwrap();

    let items = common::items_jsonl(&common::landscape_items());
    std::fs::write(temp_dir.path().join("assets.jsonl"), items).unwrap();
    run_ok(temp_dir.path(), &["import", "assets.jsonl"]);

    let stdout = run_ok(temp_dir.path(), &["items"]);
    assert!(stdout.contains("No configuration items found"));
}
