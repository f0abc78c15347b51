//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, markers)
//! - [`tree`]: Traversal tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod tree;

use crate::domain::{ConfigurationItem, RelationshipEdge, RelationshipTypeInfo};
use crate::report::{CategoryCount, LevelCount};
use crate::service::{DependencyReport, ImpactReport, ItemRelationships, RelationshipView};
use crate::traversal::TraversalTree;
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};

use color::{bold, colorize_id, colorize_relationship, colorize_status, dimmed};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
///
/// This struct holds settings that control how output is formatted,
/// including terminal width limits, ASCII fallback mode, and color output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only connectors and markers instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    #[must_use]
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `CIGRAPH_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `CIGRAPH_ASCII`: Set to "1" or "true" for ASCII-only output (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `CIGRAPH_COLOR`: Set to "0" or "false" to disable colors (default: true)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create an `OutputConfig` from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("CIGRAPH_MAX_WIDTH") {
            Some(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "CIGRAPH_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("CIGRAPH_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "CIGRAPH_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // Respect NO_COLOR (https://no-color.org/), then CIGRAPH_COLOR
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("CIGRAPH_COLOR").is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| w.0)
        .into()
}

/// Width available for wrapped text.
fn content_width(config: &OutputConfig) -> usize {
    terminal_width().min(config.max_width)
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(handle, "{json}")
}

/// Print an impact analysis in the specified format.
pub fn print_impact_report(report: &ImpactReport, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(report),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let mut handle = io::stdout().lock();
            write_analysis_text(
                &mut handle,
                &AnalysisSummary {
                    heading: "Impact analysis",
                    total_label: "Impacted items",
                    tree: &report.tree,
                    total: report.summary.total_impacted,
                    by_category: &report.summary.by_category,
                    by_level: &report.summary.by_level,
                },
                &config,
            )
        }
    }
}

/// Print a dependency analysis in the specified format.
pub fn print_dependency_report(report: &DependencyReport, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(report),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let mut handle = io::stdout().lock();
            write_analysis_text(
                &mut handle,
                &AnalysisSummary {
                    heading: "Dependency analysis",
                    total_label: "Dependencies",
                    tree: &report.tree,
                    total: report.summary.total_dependencies,
                    by_category: &report.summary.by_category,
                    by_level: &report.summary.by_level,
                },
                &config,
            )
        }
    }
}

/// Print configuration items in the specified format.
pub fn print_items(items: &[ConfigurationItem], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&items),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            write_items_text(&mut io::stdout().lock(), items, &config)
        }
    }
}

/// Print an item's relationships in the specified format.
pub fn print_item_relationships(relationships: &ItemRelationships, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(relationships),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            write_item_relationships_text(&mut io::stdout().lock(), relationships, &config)
        }
    }
}

/// Print the relationship type registry in the specified format.
pub fn print_relationship_types(types: &[RelationshipTypeInfo], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&types),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            write_relationship_types_text(&mut io::stdout().lock(), types, &config)
        }
    }
}

/// A created or removed relationship with both of its ends.
#[derive(Debug, Serialize)]
pub struct RelationshipChange<'a> {
    /// "created" or "removed"
    pub action: &'static str,
    /// The edge after the change
    pub relationship: &'a RelationshipEdge,
    /// Source item
    pub source: &'a ConfigurationItem,
    /// Target item
    pub target: &'a ConfigurationItem,
}

/// Print a relationship change in the specified format.
pub fn print_relationship_change(change: &RelationshipChange<'_>, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(change),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            write_relationship_change_text(&mut io::stdout().lock(), change, &config)
        }
    }
}

// ============================================================================
// Text Formatting
// ============================================================================

struct AnalysisSummary<'a> {
    heading: &'static str,
    total_label: &'static str,
    tree: &'a TraversalTree,
    total: usize,
    by_category: &'a [CategoryCount],
    by_level: &'a [LevelCount],
}

fn write_analysis_text<W: Write>(
    w: &mut W,
    summary: &AnalysisSummary<'_>,
    config: &OutputConfig,
) -> io::Result<()> {
    let root = summary.tree.root_item();
    writeln!(
        w,
        "{} for {} {} (depth {})",
        bold(summary.heading, config),
        colorize_id(root.cmdb_id.as_str(), config),
        root.asset_name,
        summary.tree.max_depth()
    )?;
    writeln!(w)?;
    tree::write_tree(w, summary.tree, config)?;
    writeln!(w)?;

    writeln!(w, "{}: {}", bold(summary.total_label, config), summary.total)?;
    if !summary.by_category.is_empty() {
        let categories: Vec<String> = summary
            .by_category
            .iter()
            .map(|c| format!("{} {}", c.category, c.count))
            .collect();
        writeln!(w, "  {} {}", dimmed("By category:", config), categories.join(", "))?;
    }
    if !summary.by_level.is_empty() {
        let levels: Vec<String> = summary
            .by_level
            .iter()
            .map(|l| format!("L{} {}", l.level, l.count))
            .collect();
        writeln!(w, "  {} {}", dimmed("By level:", config), levels.join(", "))?;
    }
    Ok(())
}

fn write_items_text<W: Write>(
    w: &mut W,
    items: &[ConfigurationItem],
    config: &OutputConfig,
) -> io::Result<()> {
    if items.is_empty() {
        writeln!(w, "No configuration items found.")?;
        return Ok(());
    }

    let id_width = items.iter().map(|i| i.cmdb_id.as_str().len()).max().unwrap_or(0);
    for item in items {
        // Pad before coloring so escape codes don't skew the columns
        let id = format!("{:<id_width$}", item.cmdb_id.as_str());
        writeln!(
            w,
            "{}  {} {} {}",
            colorize_id(&id, config),
            item.asset_name,
            dimmed(&format!("[{}]", item.asset_category), config),
            colorize_status(&item.status, config)
        )?;
    }
    writeln!(w)?;
    writeln!(w, "{} item(s)", items.len())
}

fn write_relationship_section<W: Write>(
    w: &mut W,
    title: &str,
    views: &[RelationshipView],
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{} ({}):", bold(title, config), views.len())?;
    if views.is_empty() {
        writeln!(w, "  {}", dimmed("none", config))?;
        return Ok(());
    }

    let width = content_width(config);
    for view in views {
        writeln!(
            w,
            "  [{}] {} {} {}",
            view.id,
            colorize_relationship(view.label, config),
            colorize_id(view.related_item.cmdb_id.as_str(), config),
            view.related_item.asset_name
        )?;
        if let Some(description) = view.description.as_deref() {
            for line in wrap_text(description, width.saturating_sub(6)) {
                writeln!(w, "      {}", dimmed(&line, config))?;
            }
        }
    }
    Ok(())
}

fn write_item_relationships_text<W: Write>(
    w: &mut W,
    relationships: &ItemRelationships,
    config: &OutputConfig,
) -> io::Result<()> {
    let item = &relationships.item;
    writeln!(
        w,
        "{} {} {} {}",
        colorize_id(item.cmdb_id.as_str(), config),
        bold(&item.asset_name, config),
        dimmed(&format!("[{}]", item.asset_category), config),
        colorize_status(&item.status, config)
    )?;

    write_relationship_section(w, "Outgoing", &relationships.outgoing, config)?;
    write_relationship_section(w, "Incoming", &relationships.incoming, config)
}

fn write_relationship_types_text<W: Write>(
    w: &mut W,
    types: &[RelationshipTypeInfo],
    config: &OutputConfig,
) -> io::Result<()> {
    let name_width = types
        .iter()
        .map(|t| t.relationship_type.as_str().len())
        .max()
        .unwrap_or(0);
    let label_width = types.iter().map(|t| t.label.len()).max().unwrap_or(0);

    for info in types {
        let name = format!("{:<name_width$}", info.relationship_type.as_str());
        let label = format!("{:<label_width$}", info.label);
        writeln!(
            w,
            "{}  {}  {}",
            colorize_relationship(&name, config),
            label,
            dimmed(info.inverse_label, config)
        )?;
    }
    Ok(())
}

fn write_relationship_change_text<W: Write>(
    w: &mut W,
    change: &RelationshipChange<'_>,
    config: &OutputConfig,
) -> io::Result<()> {
    let verb = match change.action {
        "removed" => "Removed",
        _ => "Created",
    };
    writeln!(
        w,
        "{} relationship {}: {} {} {} {}",
        success(verb, config),
        change.relationship.id,
        colorize_id(change.source.cmdb_id.as_str(), config),
        colorize_relationship(change.relationship.relationship_type.as_str(), config),
        colorize_id(change.target.cmdb_id.as_str(), config),
        dimmed(
            &format!("({} -> {})", change.source.asset_name, change.target.asset_name),
            config
        )
    )
}

/// Wrap text to `max_width`, keeping explicit line breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width.max(1))
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CmdbId, EdgeId, ItemId, RelationshipType};
    use chrono::Utc;
    use std::collections::HashMap;

    fn item(id: u64, name: &str) -> ConfigurationItem {
        ConfigurationItem {
            id: ItemId(id),
            cmdb_id: CmdbId::new(format!("CI-{id}")),
            asset_name: name.to_string(),
            asset_category: "Server".to_string(),
            status: "Active".to_string(),
        }
    }

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false, false)
    }

    fn config_from(vars: &[(&str, &str)]) -> OutputConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        OutputConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_output_config_from_lookup() {
        let config = config_from(&[("CIGRAPH_MAX_WIDTH", "120"), ("CIGRAPH_ASCII", "1")]);
        assert_eq!(config.max_width, 120);
        assert!(config.use_ascii);
        assert!(config.use_colors);

        let config = config_from(&[("CIGRAPH_MAX_WIDTH", "invalid"), ("CIGRAPH_ASCII", "false")]);
        assert_eq!(config.max_width, DEFAULT_MAX_CONTENT_WIDTH);
        assert!(!config.use_ascii);

        assert!(!config_from(&[("NO_COLOR", "1")]).use_colors);
        assert!(!config_from(&[("CIGRAPH_COLOR", "0")]).use_colors);
        assert!(!config_from(&[("CIGRAPH_COLOR", "false")]).use_colors);
        assert!(config_from(&[("CIGRAPH_COLOR", "1")]).use_colors);

        assert_eq!(config_from(&[]), OutputConfig::default());
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("This is a test of text wrapping functionality", 20);
        assert!(wrapped.len() > 1);
        for line in &wrapped {
            assert!(line.len() <= 20, "Line too long: '{line}'");
        }
        assert_eq!(wrap_text("Line one\nLine two\nLine three", 50).len(), 3);
        assert!(wrap_text("", 80).is_empty());
    }

    #[test]
    fn test_write_items_text_aligns_ids() {
        let items = vec![item(1, "web-01"), item(100, "db-01")];
        let mut buffer = Vec::new();

        write_items_text(&mut buffer, &items, &plain()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("CI-1    web-01 [Server] Active"));
        assert!(output.contains("CI-100  db-01 [Server] Active"));
        assert!(output.ends_with("2 item(s)\n"));
    }

    #[test]
    fn test_write_items_text_empty() {
        let mut buffer = Vec::new();
        write_items_text(&mut buffer, &[], &plain()).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "No configuration items found.\n");
    }

    #[test]
    fn test_write_item_relationships_text() {
        let relationships = ItemRelationships {
            item: item(2, "db-01"),
            outgoing: vec![],
            incoming: vec![RelationshipView {
                id: EdgeId(4),
                relationship_type: RelationshipType::DependsOn,
                label: "Depended on by",
                related_item: item(1, "web-01"),
                description: Some("Primary datastore".to_string()),
            }],
        };
        let mut buffer = Vec::new();

        write_item_relationships_text(&mut buffer, &relationships, &plain()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with("CI-2 db-01 [Server] Active"));
        assert!(output.contains("Outgoing (0):\n  none"));
        assert!(output.contains("[4] Depended on by CI-1 web-01"));
        assert!(output.contains("      Primary datastore"));
    }

    #[test]
    fn test_write_relationship_types_text() {
        let mut buffer = Vec::new();

        write_relationship_types_text(&mut buffer, RelationshipType::registry(), &plain()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 8);
        assert!(output.lines().next().unwrap().starts_with("depends_on   Depends on"));
        assert!(output.contains("Monitored by"));
    }

    #[test]
    fn test_write_relationship_change_text() {
        let source = item(1, "web-01");
        let target = item(2, "db-01");
        let edge = RelationshipEdge {
            id: EdgeId(9),
            source_item_id: source.id,
            target_item_id: target.id,
            relationship_type: RelationshipType::Uses,
            description: None,
            created_by: "alice".to_string(),
            created_at: Utc::now(),
            is_active: false,
        };
        let change = RelationshipChange {
            action: "removed",
            relationship: &edge,
            source: &source,
            target: &target,
        };
        let mut buffer = Vec::new();

        write_relationship_change_text(&mut buffer, &change, &plain()).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Removed relationship 9: CI-1 uses CI-2 (web-01 -> db-01)\n"
        );
    }
}
