//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;
use std::path::PathBuf;

use super::validators::{validate_cmdb_id, validate_description};
use crate::traversal::MaxDepth;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `items` command
#[derive(Parser, Debug, Clone)]
pub struct ItemsArgs {
    /// Only show items in this category (case-insensitive)
    #[arg(short, long)]
    pub category: Option<String>,
}

/// Arguments shared by the `impact` and `deps` commands
#[derive(Parser, Debug, Clone)]
pub struct AnalysisArgs {
    /// External ID of the root item
    #[arg(value_parser = validate_cmdb_id)]
    pub cmdb_id: String,

    /// Maximum traversal depth (1-10)
    ///
    /// Values below 1 or unparseable values fall back to the default of 3;
    /// values above 10 are clamped to 10.
    #[arg(short, long, allow_hyphen_values = true)]
    pub depth: Option<String>,
}

impl AnalysisArgs {
    /// The effective traversal depth.
    pub fn max_depth(&self) -> MaxDepth {
        MaxDepth::parse(self.depth.as_deref())
    }
}

/// Arguments for the `relate` command
#[derive(Parser, Debug, Clone)]
pub struct RelateArgs {
    /// External ID of the source item
    #[arg(value_parser = validate_cmdb_id)]
    pub source: String,

    /// External ID of the target item
    #[arg(value_parser = validate_cmdb_id)]
    pub target: String,

    /// Relationship type (`cigraph types` lists them)
    #[arg(short = 't', long = "type", default_value = "depends_on")]
    pub relationship_type: String,

    /// Free-form note about the relationship
    #[arg(short = 'D', long, value_parser = validate_description)]
    pub description: Option<String>,
}

/// Arguments for the `unrelate` command
#[derive(Parser, Debug, Clone)]
pub struct UnrelateArgs {
    /// ID of the relationship to remove (shown by `cigraph show`)
    pub relationship_id: u64,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// External ID of the item to display
    #[arg(value_parser = validate_cmdb_id)]
    pub cmdb_id: String,
}

/// Arguments for the `types` command
#[derive(Parser, Debug, Clone)]
pub struct TypesArgs {}

/// Arguments for the `import` command
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// JSONL file with one configuration item per line
    pub file: PathBuf,
}
