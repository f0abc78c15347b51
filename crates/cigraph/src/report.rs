//! Flat and summary views of a traversal tree.
//!
//! The tree is flattened in pre-order without its root. Circular leaves are
//! kept: they count at the level and category where they were reached again.

use crate::domain::{CmdbId, ItemId, RelationshipType};
use crate::traversal::{TraversalTree, TreeNode};
use serde::Serialize;
use std::collections::BTreeMap;

/// One non-root node of a traversal tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    /// Internal item ID
    pub id: ItemId,
    /// External item ID
    pub cmdb_id: CmdbId,
    /// Display name
    pub asset_name: String,
    /// Category
    pub asset_category: String,
    /// Lifecycle status
    pub status: String,
    /// Distance from the root (at least 1)
    pub level: usize,
    /// Type of the edge that reached the node
    pub relationship_type: RelationshipType,
    /// `true` if the item was already in the tree
    pub circular_reference: bool,
}

/// Number of flattened nodes in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Asset category
    pub category: String,
    /// Nodes in the category
    pub count: usize,
}

/// Number of flattened nodes at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    /// Distance from the root
    pub level: usize,
    /// Nodes at the level
    pub count: usize,
}

/// Flattened nodes plus their counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Non-root nodes in pre-order
    pub nodes: Vec<FlatNode>,
    /// Counts by category, ordered by category name
    pub by_category: Vec<CategoryCount>,
    /// Counts by level, ascending, without empty levels
    pub by_level: Vec<LevelCount>,
}

impl Aggregate {
    /// Number of flattened nodes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.nodes.len()
    }
}

fn flat_node(node: &TreeNode, relationship_type: RelationshipType) -> FlatNode {
    let item = node.item();
    FlatNode {
        id: item.id,
        cmdb_id: item.cmdb_id.clone(),
        asset_name: item.asset_name.clone(),
        asset_category: item.asset_category.clone(),
        status: item.status.clone(),
        level: node.level(),
        relationship_type,
        circular_reference: node.is_circular(),
    }
}

/// Flatten `tree` and count its nodes.
#[must_use]
pub fn aggregate(tree: &TraversalTree) -> Aggregate {
    // Only the root lacks a relationship type
    let nodes: Vec<FlatNode> = tree
        .iter()
        .filter_map(|node| {
            node.relationship_type()
                .map(|relationship_type| flat_node(node, relationship_type))
        })
        .collect();

    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    let mut levels: BTreeMap<usize, usize> = BTreeMap::new();
    for node in &nodes {
        *categories.entry(node.asset_category.as_str()).or_default() += 1;
        *levels.entry(node.level).or_default() += 1;
    }

    let by_category = categories
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    let by_level = levels
        .into_iter()
        .map(|(level, count)| LevelCount { level, count })
        .collect();

    Aggregate {
        nodes,
        by_category,
        by_level,
    }
}
