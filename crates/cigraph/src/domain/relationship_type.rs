//! Relationship type registry.
//!
//! The set of relationship types is closed: a relationship can only be created
//! with one of the eight [`RelationshipType`] variants. Each type carries a
//! display label, used when the edge is rendered from its source, and an
//! inverse label, used when the same single edge is rendered from its target.
//!
//! The inverse label never implies a second stored edge. A `depends_on` edge
//! from `web-01` to `db-01` reads "Depends on db-01" on the web server and
//! "Depended on by web-01" on the database.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of a directed relationship between two configuration items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Source needs target to function
    DependsOn,

    /// Source hosts target (e.g., a VM hosting a service)
    Hosts,

    /// Source has a network connection to target
    ConnectsTo,

    /// Source is a component of target
    PartOf,

    /// Source consumes target
    Uses,

    /// Source provides target
    Provides,

    /// Source backs up target
    BacksUp,

    /// Source monitors target
    Monitors,
}

/// One row of the relationship type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipTypeInfo {
    /// The relationship type
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    /// Label shown on the source side of the edge
    pub label: &'static str,

    /// Label shown on the target side of the edge
    pub inverse_label: &'static str,
}

/// The registry table, in declaration order.
const REGISTRY: [RelationshipTypeInfo; 8] = [
    RelationshipTypeInfo {
        relationship_type: RelationshipType::DependsOn,
        label: "Depends on",
        inverse_label: "Depended on by",
    },
    RelationshipTypeInfo {
        relationship_type: RelationshipType::Hosts,
        label: "Hosts",
        inverse_label: "Hosted on",
    },
    RelationshipTypeInfo {
        relationship_type: RelationshipType::ConnectsTo,
        label: "Connects to",
        inverse_label: "Connected from",
    },
    RelationshipTypeInfo {
        relationship_type: RelationshipType::PartOf,
        label: "Part of",
        inverse_label: "Contains",
    },
    RelationshipTypeInfo {
        relationship_type: RelationshipType::Uses,
        label: "Uses",
        inverse_label: "Used by",
    },
    RelationshipTypeInfo {
        relationship_type: RelationshipType::Provides,
        label: "Provides",
        inverse_label: "Provided by",
    },
    RelationshipTypeInfo {
        relationship_type: RelationshipType::BacksUp,
        label: "Backs up",
        inverse_label: "Backed up by",
    },
    RelationshipTypeInfo {
        relationship_type: RelationshipType::Monitors,
        label: "Monitors",
        inverse_label: "Monitored by",
    },
];

impl RelationshipType {
    /// All relationship types, in registry order.
    #[must_use]
    pub fn all() -> impl Iterator<Item = RelationshipType> {
        REGISTRY.iter().map(|info| info.relationship_type)
    }

    /// The full registry table.
    #[must_use]
    pub fn registry() -> &'static [RelationshipTypeInfo] {
        &REGISTRY
    }

    /// Wire name of this type (e.g., `depends_on`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DependsOn => "depends_on",
            Self::Hosts => "hosts",
            Self::ConnectsTo => "connects_to",
            Self::PartOf => "part_of",
            Self::Uses => "uses",
            Self::Provides => "provides",
            Self::BacksUp => "backs_up",
            Self::Monitors => "monitors",
        }
    }

    /// Registry entry for this type.
    #[must_use]
    pub fn info(self) -> &'static RelationshipTypeInfo {
        // REGISTRY is declared in variant order
        &REGISTRY[self as usize]
    }

    /// Label used when rendering the edge from its source.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// Label used when rendering the edge from its target.
    #[must_use]
    pub fn inverse_label(self) -> &'static str {
        self.info().inverse_label
    }

    /// Returns `true` if `name` is a registered relationship type.
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        name.parse::<RelationshipType>().is_ok()
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidRelationshipType(s.to_string()))
    }
}

/// Relationship type filter applied when listing a node's edges.
///
/// Names are compared against [`RelationshipType::as_str`], so a name that is
/// not a registered type is accepted but never matches a stored edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter<'a> {
    /// Every relationship type
    Any,

    /// Only the named relationship types
    Names(&'a [&'a str]),
}

impl TypeFilter<'_> {
    /// Returns `true` if an edge of `relationship_type` passes the filter.
    #[must_use]
    pub fn matches(&self, relationship_type: RelationshipType) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Names(names) => names.contains(&relationship_type.as_str()),
        }
    }
}
