//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use cigraph::domain::{CmdbId, ConfigurationItem, ItemId, NewEdge, RelationshipType};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path of the `cigraph` binary built for this test run
pub fn cigraph_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cigraph"))
}

/// Run the cigraph binary in the specified directory
///
/// Colors are disabled and the actor is cleared so output is deterministic.
pub fn run_cigraph_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(cigraph_binary())
        .args(args)
        .current_dir(dir)
        .env("CIGRAPH_COLOR", "0")
        .env_remove("CIGRAPH_ACTOR")
        .env_remove("CIGRAPH_ASCII")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cigraph binary")
}

/// Run the binary and assert it succeeded, returning stdout
pub fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run_cigraph_in_dir(dir, args);
    assert!(
        output.status.success(),
        "cigraph {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run the binary with `--json` and parse stdout
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let stdout = run_ok(dir, &full);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

/// Build a configuration item with ID `CI-<id>`
pub fn item(id: u64, name: &str, category: &str) -> ConfigurationItem {
    ConfigurationItem {
        id: ItemId(id),
        cmdb_id: CmdbId::new(format!("CI-{id}")),
        asset_name: name.to_string(),
        asset_category: category.to_string(),
        status: "Active".to_string(),
    }
}

/// Items as JSONL, one per line
pub fn items_jsonl(items: &[ConfigurationItem]) -> String {
    items
        .iter()
        .map(|i| serde_json::to_string(i).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A new edge between two internal IDs
pub fn new_edge(from: u64, to: u64, relationship_type: RelationshipType) -> NewEdge {
    NewEdge {
        source_item_id: ItemId(from),
        target_item_id: ItemId(to),
        relationship_type,
        description: None,
        created_by: "test".to_string(),
    }
}

/// A small service landscape used by several tests:
///
/// ```text
/// web-01 (1) --depends_on--> app-01 (2) --depends_on--> db-01 (3)
/// batch-01 (4) --uses--> db-01 (3)
/// vm-01 (5) --hosts--> app-01 (2)
/// ```
pub fn landscape_items() -> Vec<ConfigurationItem> {
    vec![
        item(1, "web-01", "Server"),
        item(2, "app-01", "Application"),
        item(3, "db-01", "Database"),
        item(4, "batch-01", "Application"),
        item(5, "vm-01", "Virtual Machine"),
    ]
}
