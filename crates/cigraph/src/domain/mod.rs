//! Domain types for the configuration item relationship graph.
//!
//! Configuration items (CIs) are owned by the wider CMDB and are read-only
//! here. Relationships are directed, typed edges between two CIs that are
//! soft-deleted rather than removed.

mod relationship_type;

pub use relationship_type::{RelationshipType, RelationshipTypeInfo, TypeFilter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal numeric identifier of a configuration item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable external identifier of a configuration item (e.g., `CI-00042`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CmdbId(pub String);

impl CmdbId {
    /// Create a new external ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of the ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CmdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CmdbId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CmdbId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a stored relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A configuration item as seen by the relationship engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationItem {
    /// Internal numeric ID
    pub id: ItemId,

    /// External identifier
    pub cmdb_id: CmdbId,

    /// Display name
    pub asset_name: String,

    /// Category (e.g., "Server", "Database", "Application")
    pub asset_category: String,

    /// Lifecycle status (e.g., "Active", "Retired")
    pub status: String,
}

/// A directed, typed relationship between two configuration items.
///
/// The source "points to" the target under the semantics of the type:
/// `web-01 depends_on db-01` means the web server needs the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    /// Edge identifier
    pub id: EdgeId,

    /// Item the edge starts from
    pub source_item_id: ItemId,

    /// Item the edge points to
    pub target_item_id: ItemId,

    /// Relationship type
    pub relationship_type: RelationshipType,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,

    /// Actor that created the edge
    pub created_by: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// `false` once the edge has been removed
    pub is_active: bool,
}

/// Data for creating a new relationship edge in a store.
#[derive(Debug, Clone)]
pub struct NewEdge {
    /// Item the edge starts from
    pub source_item_id: ItemId,

    /// Item the edge points to
    pub target_item_id: ItemId,

    /// Relationship type
    pub relationship_type: RelationshipType,

    /// Free-form description
    pub description: Option<String>,

    /// Actor creating the edge
    pub created_by: String,
}

/// The item at the other end of one active edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    /// Edge connecting the queried item to `item`
    pub edge_id: EdgeId,

    /// Item at the other end of the edge
    pub item: ConfigurationItem,

    /// Type of the connecting edge
    pub relationship_type: RelationshipType,

    /// Description of the connecting edge
    pub description: Option<String>,
}

/// Kind of change recorded against a configuration item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// A relationship involving the item was created
    RelationshipAdded,

    /// A relationship involving the item was deactivated
    RelationshipRemoved,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::RelationshipAdded => f.write_str("relationship_added"),
            ChangeType::RelationshipRemoved => f.write_str("relationship_removed"),
        }
    }
}

/// Field name used for every relationship change entry.
pub const RELATIONSHIP_FIELD: &str = "relationship";

/// One change-history entry emitted for a configuration item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// Item the change is recorded against
    pub cmdb_item_id: ItemId,

    /// Kind of change
    pub change_type: ChangeType,

    /// Changed field
    pub field_name: String,

    /// Value before the change
    pub old_value: Option<String>,

    /// Value after the change
    pub new_value: Option<String>,

    /// Who made the change
    pub actor: String,

    /// When the change was made
    pub recorded_at: DateTime<Utc>,
}

/// A caller request to relate two configuration items.
///
/// The relationship type is kept as the raw name supplied by the caller so
/// that unknown names can be reported as `invalid_type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRequest {
    /// External ID of the source item
    pub source_cmdb_id: CmdbId,

    /// External ID of the target item
    pub target_cmdb_id: CmdbId,

    /// Relationship type name (e.g., `depends_on`)
    pub relationship_type: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}
