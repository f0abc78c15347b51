//! Traversal tree rendering for `cigraph impact` and `cigraph deps` output.

use std::io::{self, Write};

use colored::Colorize;

use super::OutputConfig;
use super::color::{circular_marker, colorize_id, colorize_status, dimmed, relationship_tag};
use crate::domain::ConfigurationItem;
use crate::traversal::{NodeId, TraversalTree};

/// Render a traversal tree with ASCII/Unicode connectors.
///
/// Renders a tree like:
/// ```text
/// ◆ CI-2 db-01 [Database] Active
/// ├── CI-1 web-01 [Server] (depends_on) Active
/// │   └── CI-4 lb-01 [Network] (uses) Active
/// └── CI-3 batch-01 [Server] (depends_on) Active ↺ seen above
/// ```
pub fn write_tree<W: Write>(w: &mut W, tree: &TraversalTree, config: &OutputConfig) -> io::Result<()> {
    let root_icon = if config.use_ascii { "*" } else { "◆" };
    let root_icon_str = if config.use_colors {
        root_icon.cyan().bold().to_string()
    } else {
        root_icon.to_string()
    };

    writeln!(w, "{} {}", root_icon_str, item_summary(tree.root_item(), config))?;

    write_children(w, tree, tree.root(), &[], config)
}

fn item_summary(item: &ConfigurationItem, config: &OutputConfig) -> String {
    format!(
        "{} {} {}",
        colorize_id(item.cmdb_id.as_str(), config),
        item.asset_name,
        dimmed(&format!("[{}]", item.asset_category), config)
    )
}

/// Render the children of `parent` with proper connector lines.
///
/// `prefix_segments` tracks which ancestor levels still have siblings below,
/// used to draw the vertical continuation lines (`│`).
fn write_children<W: Write>(
    w: &mut W,
    tree: &TraversalTree,
    parent: NodeId,
    prefix_segments: &[bool],
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    let children = tree.node(parent).children();
    for (i, &child_id) in children.iter().enumerate() {
        let child = tree.node(child_id);
        let is_last = i == children.len() - 1;

        let mut prefix = String::new();
        for &has_more in prefix_segments {
            prefix.push_str(&dimmed(if has_more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { branch }, config);

        let relationship = child
            .relationship_type()
            .map(|rt| format!(" {}", relationship_tag(rt, config)))
            .unwrap_or_default();
        let circular = if child.is_circular() {
            format!(" {}", circular_marker(config))
        } else {
            String::new()
        };

        writeln!(
            w,
            "{}{}{}{} {}{}",
            prefix,
            connector,
            item_summary(child.item(), config),
            relationship,
            colorize_status(&child.item().status, config),
            circular
        )?;

        if !child.children().is_empty() {
            let mut next_segments = prefix_segments.to_vec();
            next_segments.push(!is_last);
            write_children(w, tree, child_id, &next_segments, config)?;
        }
    }

    Ok(())
}
