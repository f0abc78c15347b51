//! Depth-bounded, cycle-safe traversal of the relationship graph.
//!
//! Two directions are supported over the same edge set:
//!
//! - **Impact** ([`build_impact_tree`]): what stops working if the root fails.
//!   Each step follows edges *into* the current item.
//! - **Dependency** ([`build_dependency_tree`]): what the root needs. Each
//!   step follows edges *out of* the current item.
//!
//! Only edges whose type is in [`TRAVERSAL_TYPES`] are followed.
//!
//! # Visited set
//!
//! One visited set is shared by the whole traversal. The first sighting of an
//! item is expanded; every later sighting, whether it closes a real cycle or
//! reaches the same item through a second branch of a diamond, becomes a
//! [`TreeNode::CircularLeaf`]. Which branch gets the expanded copy follows
//! from the sibling order: children are visited by asset name, then external
//! ID, then relationship type name.
//!
//! # Termination
//!
//! A branch stops when its node sits at `max_depth` (the node is still listed,
//! but its neighbors are never queried), when the node was already visited,
//! or when the store reports no matching edges.
//!
//! The traversal is an explicit worklist over a node arena, so the call depth
//! does not grow with the tree. The arena is filled in depth-first pre-order.

use crate::domain::{ConfigurationItem, Neighbor, RelationshipType, TypeFilter};
use crate::error::Result;
use crate::storage::RelationshipStore;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Relationship type names followed by both traversal directions.
///
/// `hosted_by` is not a registered type, so it never matches a stored edge.
pub const TRAVERSAL_TYPES: &[&str] = &["depends_on", "uses", "hosted_by"];

/// Validated traversal depth bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MaxDepth(usize);

impl MaxDepth {
    /// Depth used when none (or an unusable one) is given.
    pub const DEFAULT: usize = 3;

    /// Smallest accepted depth.
    pub const MIN: usize = 1;

    /// Largest accepted depth. Larger requests are clamped to this.
    pub const MAX: usize = 10;

    /// Build a depth bound from a requested value.
    ///
    /// Zero and negative values fall back to [`MaxDepth::DEFAULT`]; values
    /// above [`MaxDepth::MAX`] are clamped.
    #[must_use]
    pub fn new(requested: i64) -> Self {
        match usize::try_from(requested) {
            Ok(depth) if depth >= Self::MIN => Self(depth.min(Self::MAX)),
            _ => Self::default(),
        }
    }

    /// Parse a depth bound from optional user input.
    ///
    /// Only the leading integer is read: `"4abc"` is 4 and `"2.5"` is 2.
    /// Missing or non-numeric input gives [`MaxDepth::DEFAULT`].
    #[must_use]
    pub fn parse(input: Option<&str>) -> Self {
        input
            .and_then(leading_integer)
            .map_or_else(Self::default, Self::new)
    }

    /// The depth bound as a number of levels below the root.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for MaxDepth {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for MaxDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read an optionally signed integer prefix, ignoring leading whitespace.
///
/// Prefixes too large for `i64` saturate so they still clamp to the maximum.
fn leading_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Which way a traversal follows edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow incoming edges: who is affected if the root fails
    Impact,
    /// Follow outgoing edges: what the root needs
    Dependency,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Impact => f.write_str("impact"),
            Direction::Dependency => f.write_str("dependency"),
        }
    }
}

/// Index of a node in a [`TraversalTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the tree's pre-order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of a traversal tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// First sighting of an item.
    ///
    /// `children` is empty when the item has no matching edges or sits at
    /// the depth bound.
    Expanded {
        /// The item
        item: ConfigurationItem,
        /// Type of the edge that reached this node; `None` for the root
        relationship_type: Option<RelationshipType>,
        /// Distance from the root
        level: usize,
        /// Child nodes, in visiting order
        children: Vec<NodeId>,
    },

    /// Later sighting of an item already in the tree. Never expanded.
    CircularLeaf {
        /// The item
        item: ConfigurationItem,
        /// Type of the edge that reached this node
        relationship_type: RelationshipType,
        /// Distance from the root
        level: usize,
    },
}

impl TreeNode {
    /// The item at this node.
    #[must_use]
    pub fn item(&self) -> &ConfigurationItem {
        match self {
            TreeNode::Expanded { item, .. } | TreeNode::CircularLeaf { item, .. } => item,
        }
    }

    /// Distance from the root.
    #[must_use]
    pub fn level(&self) -> usize {
        match self {
            TreeNode::Expanded { level, .. } | TreeNode::CircularLeaf { level, .. } => *level,
        }
    }

    /// Type of the edge that reached this node; `None` for the root.
    #[must_use]
    pub fn relationship_type(&self) -> Option<RelationshipType> {
        match self {
            TreeNode::Expanded {
                relationship_type, ..
            } => *relationship_type,
            TreeNode::CircularLeaf {
                relationship_type, ..
            } => Some(*relationship_type),
        }
    }

    /// Child nodes; always empty for circular leaves.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match self {
            TreeNode::Expanded { children, .. } => children,
            TreeNode::CircularLeaf { .. } => &[],
        }
    }

    /// Returns `true` for a repeated sighting.
    #[must_use]
    pub fn is_circular(&self) -> bool {
        matches!(self, TreeNode::CircularLeaf { .. })
    }
}

/// Result of one traversal.
///
/// Nodes live in an arena in depth-first pre-order; the root is always the
/// first node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalTree {
    direction: Direction,
    max_depth: MaxDepth,
    nodes: Vec<TreeNode>,
}

impl TraversalTree {
    /// The root node's ID.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The root item.
    #[must_use]
    pub fn root_item(&self) -> &ConfigurationItem {
        self.nodes[0].item()
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Children of a node, resolved.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> {
        self.node(id).children().iter().map(|&child| self.node(child))
    }

    /// Every node in depth-first pre-order, root first.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direction the tree was built in.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Depth bound the tree was built with.
    #[must_use]
    pub fn max_depth(&self) -> MaxDepth {
        self.max_depth
    }
}

/// Nested JSON form of one node.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeJson<'a> {
    #[serde(flatten)]
    item: &'a ConfigurationItem,
    relationship_type: Option<RelationshipType>,
    level: usize,
    circular_reference: bool,
    children: Vec<NodeRef<'a>>,
}

struct NodeRef<'a> {
    tree: &'a TraversalTree,
    id: NodeId,
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let node = self.tree.node(self.id);
        NodeJson {
            item: node.item(),
            relationship_type: node.relationship_type(),
            level: node.level(),
            circular_reference: node.is_circular(),
            children: node
                .children()
                .iter()
                .map(|&id| NodeRef {
                    tree: self.tree,
                    id,
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

impl Serialize for TraversalTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        NodeRef {
            tree: self,
            id: self.root(),
        }
        .serialize(serializer)
    }
}

/// Build the tree of items affected if `root` fails.
///
/// # Errors
///
/// Returns the first store error; no partial tree is produced.
pub async fn build_impact_tree(
    store: &dyn RelationshipStore,
    root: &ConfigurationItem,
    max_depth: MaxDepth,
) -> Result<TraversalTree> {
    build_tree(store, root, max_depth, Direction::Impact).await
}

/// Build the tree of items `root` depends on.
///
/// # Errors
///
/// Returns the first store error; no partial tree is produced.
pub async fn build_dependency_tree(
    store: &dyn RelationshipStore,
    root: &ConfigurationItem,
    max_depth: MaxDepth,
) -> Result<TraversalTree> {
    build_tree(store, root, max_depth, Direction::Dependency).await
}

/// An expanded node whose neighbors are still being visited.
struct Frame {
    node: NodeId,
    level: usize,
    /// Sorted neighbors, reversed so the next one to visit is at the end.
    pending: Vec<Neighbor>,
}

async fn neighbors_in_order(
    store: &dyn RelationshipStore,
    item: &ConfigurationItem,
    direction: Direction,
) -> Result<Vec<Neighbor>> {
    let filter = TypeFilter::Names(TRAVERSAL_TYPES);
    let mut neighbors = match direction {
        Direction::Impact => store.list_incoming_edges(item.id, filter).await?,
        Direction::Dependency => store.list_outgoing_edges(item.id, filter).await?,
    };

    tracing::debug!(
        cmdb_id = %item.cmdb_id,
        %direction,
        neighbors = neighbors.len(),
        "Queried neighbors"
    );

    neighbors.sort_by(|a, b| {
        a.item
            .asset_name
            .cmp(&b.item.asset_name)
            .then_with(|| a.item.cmdb_id.cmp(&b.item.cmdb_id))
            .then_with(|| a.relationship_type.as_str().cmp(b.relationship_type.as_str()))
    });
    neighbors.reverse();
    Ok(neighbors)
}

async fn build_tree(
    store: &dyn RelationshipStore,
    root: &ConfigurationItem,
    max_depth: MaxDepth,
    direction: Direction,
) -> Result<TraversalTree> {
    let limit = max_depth.get();
    let mut nodes = vec![TreeNode::Expanded {
        item: root.clone(),
        relationship_type: None,
        level: 0,
        children: Vec::new(),
    }];
    let mut visited = HashSet::from([root.id]);
    let mut stack = vec![Frame {
        node: NodeId(0),
        level: 0,
        pending: neighbors_in_order(store, root, direction).await?,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(neighbor) = frame.pending.pop() else {
            stack.pop();
            continue;
        };

        let parent = frame.node;
        let level = frame.level + 1;
        let id = NodeId(nodes.len());
        let first_sighting = visited.insert(neighbor.item.id);

        let child = if first_sighting {
            TreeNode::Expanded {
                item: neighbor.item,
                relationship_type: Some(neighbor.relationship_type),
                level,
                children: Vec::new(),
            }
        } else {
            TreeNode::CircularLeaf {
                item: neighbor.item,
                relationship_type: neighbor.relationship_type,
                level,
            }
        };

        let pending = if first_sighting && level < limit {
            Some(neighbors_in_order(store, child.item(), direction).await?)
        } else {
            None
        };

        nodes.push(child);
        if let TreeNode::Expanded { children, .. } = &mut nodes[parent.0] {
            children.push(id);
        }
        if let Some(pending) = pending {
            stack.push(Frame {
                node: id,
                level,
                pending,
            });
        }
    }

    tracing::debug!(
        root = %root.cmdb_id,
        %direction,
        %max_depth,
        nodes = nodes.len(),
        "Traversal complete"
    );

    Ok(TraversalTree {
        direction,
        max_depth,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CmdbId, ItemId, NewEdge};
    use crate::storage::{MockStore, StorageBackend, create_storage};
    use rstest::rstest;

    fn item(id: u64, name: &str) -> ConfigurationItem {
        ConfigurationItem {
            id: ItemId(id),
            cmdb_id: CmdbId::new(format!("CI-{id}")),
            asset_name: name.to_string(),
            asset_category: "Server".to_string(),
            status: "Active".to_string(),
        }
    }

    /// Build a store with items `1..=names.len()` named from `names` and the
    /// given `(source, target, type)` edges.
    async fn store_with(
        names: &[&str],
        edges: &[(u64, u64, RelationshipType)],
    ) -> Box<dyn RelationshipStore> {
        let mut store = create_storage(StorageBackend::InMemory).await.unwrap();
        let items = names
            .iter()
            .zip(1..)
            .map(|(name, id)| item(id, name))
            .collect();
        store.import_items(items).await.unwrap();

        for &(from, to, relationship_type) in edges {
            store
                .create_edge(NewEdge {
                    source_item_id: ItemId(from),
                    target_item_id: ItemId(to),
                    relationship_type,
                    description: None,
                    created_by: "test".to_string(),
                })
                .await
                .unwrap();
        }
        store
    }

    async fn root(store: &dyn RelationshipStore, id: u64) -> ConfigurationItem {
        store.get_item(ItemId(id)).await.unwrap().unwrap()
    }

    fn names(tree: &TraversalTree) -> Vec<(&str, usize, bool)> {
        tree.iter()
            .map(|node| (node.item().asset_name.as_str(), node.level(), node.is_circular()))
            .collect()
    }

    use RelationshipType::{ConnectsTo, DependsOn, Hosts, Uses};

    #[rstest]
    #[case(Some("50"), 10)]
    #[case(Some("10"), 10)]
    #[case(Some("1"), 1)]
    #[case(Some("-1"), 3)]
    #[case(Some("0"), 3)]
    #[case(Some("abc"), 3)]
    #[case(Some(""), 3)]
    #[case(None, 3)]
    #[case(Some("4abc"), 4)]
    #[case(Some("2.5"), 2)]
    #[case(Some("  7"), 7)]
    #[case(Some("+5"), 5)]
    #[case(Some("99999999999999999999999"), 10)]
    fn test_max_depth_parse(#[case] input: Option<&str>, #[case] expected: usize) {
        assert_eq!(MaxDepth::parse(input).get(), expected);
    }

    #[rstest]
    #[case(i64::MIN, 3)]
    #[case(-1, 3)]
    #[case(0, 3)]
    #[case(1, 1)]
    #[case(9, 9)]
    #[case(11, 10)]
    #[case(i64::MAX, 10)]
    fn test_max_depth_new(#[case] requested: i64, #[case] expected: usize) {
        assert_eq!(MaxDepth::new(requested).get(), expected);
    }

    #[tokio::test]
    async fn test_depth_one_lists_filtered_outgoing_neighbors() {
        let store = store_with(
            &["app", "db", "cache", "switch", "grandchild"],
            &[(1, 2, DependsOn), (1, 3, Uses), (1, 4, ConnectsTo), (2, 5, DependsOn)],
        )
        .await;
        let app = root(store.as_ref(), 1).await;

        let tree = build_dependency_tree(store.as_ref(), &app, MaxDepth::new(1))
            .await
            .unwrap();

        assert_eq!(
            names(&tree),
            vec![("app", 0, false), ("cache", 1, false), ("db", 1, false)]
        );
        // Nodes at the bound are expanded without children
        assert!(tree.children(tree.root()).all(|child| child.children().is_empty()));
    }

    #[tokio::test]
    async fn test_impact_follows_incoming_edges() {
        let store = store_with(&["web", "db"], &[(1, 2, DependsOn)]).await;
        let db = root(store.as_ref(), 2).await;

        let tree = build_impact_tree(store.as_ref(), &db, MaxDepth::default())
            .await
            .unwrap();

        let children: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].item().asset_name, "web");
        assert_eq!(children[0].relationship_type(), Some(DependsOn));
        assert_eq!(children[0].level(), 1);
        assert_eq!(tree.direction(), Direction::Impact);
    }

    #[tokio::test]
    async fn test_cycle_terminates_with_circular_leaf() {
        let store = store_with(&["a", "b"], &[(1, 2, DependsOn), (2, 1, DependsOn)]).await;
        let a = root(store.as_ref(), 1).await;

        let tree = build_dependency_tree(store.as_ref(), &a, MaxDepth::new(5))
            .await
            .unwrap();

        assert_eq!(
            names(&tree),
            vec![("a", 0, false), ("b", 1, false), ("a", 2, true)]
        );
        assert!(tree.node(NodeId(2)).children().is_empty());
    }

    #[tokio::test]
    async fn test_diamond_second_sighting_is_circular() {
        // a -> b, a -> c, b -> d, c -> d
        let store = store_with(
            &["a", "b", "c", "d", "e"],
            &[
                (1, 2, DependsOn),
                (1, 3, DependsOn),
                (2, 4, DependsOn),
                (3, 4, DependsOn),
                (4, 5, Uses),
            ],
        )
        .await;
        let a = root(store.as_ref(), 1).await;

        let tree = build_dependency_tree(store.as_ref(), &a, MaxDepth::new(5))
            .await
            .unwrap();

        assert_eq!(
            names(&tree),
            vec![
                ("a", 0, false),
                ("b", 1, false),
                ("d", 2, false),
                ("e", 3, false),
                ("c", 1, false),
                ("d", 2, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_children_sorted_by_name_then_cmdb_id() {
        let store = store_with(
            &["root", "zeta", "alpha", "alpha", "Mid"],
            &[(2, 1, Uses), (4, 1, DependsOn), (3, 1, DependsOn), (5, 1, Uses)],
        )
        .await;
        let r = root(store.as_ref(), 1).await;

        let tree = build_impact_tree(store.as_ref(), &r, MaxDepth::new(1))
            .await
            .unwrap();

        let order: Vec<_> = tree
            .children(tree.root())
            .map(|node| node.item().cmdb_id.as_str())
            .collect();
        // Byte order puts "Mid" before lowercase names
        assert_eq!(order, vec!["CI-5", "CI-3", "CI-4", "CI-2"]);
    }

    #[tokio::test]
    async fn test_same_pair_with_two_types_shows_second_as_circular() {
        let store = store_with(&["app", "db"], &[(1, 2, Uses), (1, 2, DependsOn)]).await;
        let app = root(store.as_ref(), 1).await;

        let tree = build_dependency_tree(store.as_ref(), &app, MaxDepth::default())
            .await
            .unwrap();

        let children: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].relationship_type(), Some(DependsOn));
        assert!(!children[0].is_circular());
        assert_eq!(children[1].relationship_type(), Some(Uses));
        assert!(children[1].is_circular());
    }

    #[tokio::test]
    async fn test_unfollowed_types_are_ignored() {
        let store = store_with(&["vm", "svc"], &[(1, 2, Hosts)]).await;
        let vm = root(store.as_ref(), 1).await;

        let tree = build_dependency_tree(store.as_ref(), &vm, MaxDepth::default())
            .await
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
    }

    #[tokio::test]
    async fn test_nodes_at_bound_are_not_queried() {
        // Chain: 1 -> 2 -> 3 -> 4
        let inner = store_with(
            &["one", "two", "three", "four"],
            &[(1, 2, DependsOn), (2, 3, DependsOn), (3, 4, DependsOn)],
        )
        .await;
        let store = MockStore::new(inner);
        let one = root(&store, 1).await;

        let tree = build_dependency_tree(&store, &one, MaxDepth::new(2))
            .await
            .unwrap();

        assert_eq!(
            names(&tree),
            vec![("one", 0, false), ("two", 1, false), ("three", 2, false)]
        );
        // Root and level 1 only
        assert_eq!(store.edge_query_count(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_traversal() {
        let inner = store_with(
            &["one", "two", "three"],
            &[(1, 2, DependsOn), (2, 3, DependsOn)],
        )
        .await;
        let store = MockStore::new(inner).fail_after(1);
        let one = root(&store, 1).await;

        let err = build_dependency_tree(&store, &one, MaxDepth::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "store_error");
    }

    #[tokio::test]
    async fn test_tree_serializes_nested() {
        let store = store_with(&["web", "db"], &[(1, 2, DependsOn)]).await;
        let db = root(store.as_ref(), 2).await;

        let tree = build_impact_tree(store.as_ref(), &db, MaxDepth::default())
            .await
            .unwrap();
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json["cmdbId"], "CI-2");
        assert_eq!(json["assetName"], "db");
        assert_eq!(json["level"], 0);
        assert!(json["relationshipType"].is_null());
        assert_eq!(json["circularReference"], false);
        assert_eq!(json["children"][0]["assetName"], "web");
        assert_eq!(json["children"][0]["relationshipType"], "depends_on");
        assert_eq!(json["children"][0]["children"], serde_json::json!([]));
    }
}
