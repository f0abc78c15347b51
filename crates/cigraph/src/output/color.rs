//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success:        green   (active items, completed actions)
//!   - Warning:        yellow  (circular references, non-active statuses)
//!   - Error:          red     (failed actions)
//!   - Info/Reference: cyan    (external IDs, root tree node)
//!   - Accent:         magenta (relationship types and labels)
//!   - Muted:          dimmed  (categories, connectors, retired items)
//!   - Emphasis:       bold    (section headers)

use crate::domain::RelationshipType;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Colorize an external item ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Colorize a lifecycle status.
///
/// Statuses are free-form CMDB values, so only the common ones get a color.
pub(crate) fn colorize_status(status: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return status.to_string();
    }
    match status.to_ascii_lowercase().as_str() {
        "active" | "operational" | "in service" => status.green().to_string(),
        "retired" | "decommissioned" | "disposed" => status.dimmed().to_string(),
        _ => status.yellow().to_string(),
    }
}

/// Colorize a relationship type or label (magenta).
pub(crate) fn colorize_relationship(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.magenta().to_string()
}

/// Marker appended to a repeated sighting in a tree, with ASCII fallback.
pub(crate) fn circular_marker(config: &OutputConfig) -> String {
    let marker = if config.use_ascii {
        "(seen above)"
    } else {
        "↺ seen above"
    };
    if !config.use_colors {
        return marker.to_string();
    }
    marker.yellow().to_string()
}

/// Format a relationship type for a tree edge, e.g. `(depends_on)`.
pub(crate) fn relationship_tag(relationship_type: RelationshipType, config: &OutputConfig) -> String {
    colorize_relationship(&format!("({relationship_type})"), config)
}

/// Apply dimmed style to text (for categories and field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
