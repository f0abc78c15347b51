//! Property-based tests for impact and dependency traversal.
//!
//! Random relationship graphs (cycles, diamonds, parallel edges of different
//! types) are built in an in-memory store and every traversal is checked
//! against invariants that must hold regardless of shape.

use std::collections::{HashMap, HashSet};

use cigraph::domain::{ConfigurationItem, ItemId, RelationshipType};
use cigraph::report::aggregate;
use cigraph::storage::RelationshipStore;
use cigraph::storage::in_memory::new_in_memory_store;
use cigraph::traversal::{MaxDepth, TraversalTree, build_dependency_tree, build_impact_tree};
use proptest::prelude::*;

mod common;
use common::{item, new_edge};

// ── Strategies ───────────────────────────────────────────────────────────

const TYPES: [RelationshipType; 4] = [
    RelationshipType::DependsOn,
    RelationshipType::Uses,
    RelationshipType::Hosts,
    RelationshipType::Monitors,
];

fn is_followed(relationship_type: RelationshipType) -> bool {
    matches!(
        relationship_type,
        RelationshipType::DependsOn | RelationshipType::Uses
    )
}

#[derive(Debug, Clone)]
struct GraphSpec {
    items: usize,
    edges: Vec<(usize, usize, RelationshipType)>,
}

/// Up to 8 items with up to 20 edges between them.
fn graph_spec() -> impl Strategy<Value = GraphSpec> {
    (2usize..=8).prop_flat_map(|items| {
        let edge = (0..items, 0..items, prop::sample::select(TYPES.to_vec()));
        prop::collection::vec(edge, 0..20).prop_map(move |edges| GraphSpec { items, edges })
    })
}

fn depth() -> impl Strategy<Value = MaxDepth> {
    (1i64..=10).prop_map(MaxDepth::new)
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Build the store, skipping self-loops and duplicates the store rejects.
/// Returns the accepted `(source, target, type)` edges.
async fn build_store(
    spec: &GraphSpec,
) -> (Box<dyn RelationshipStore>, Vec<(ItemId, ItemId, RelationshipType)>) {
    let mut store = new_in_memory_store();
    // Names repeat so ordering falls back to external IDs
    let items: Vec<ConfigurationItem> = (1..=spec.items as u64)
        .map(|i| item(i, &format!("node-{}", i % 3), "Server"))
        .collect();
    store.import_items(items).await.unwrap();

    let mut accepted = Vec::new();
    for &(from, to, relationship_type) in &spec.edges {
        let (from, to) = (from as u64 + 1, to as u64 + 1);
        if let Ok(edge) = store.create_edge(new_edge(from, to, relationship_type)).await {
            accepted.push((edge.source_item_id, edge.target_item_id, relationship_type));
        }
    }
    (store, accepted)
}

/// Item of each non-root node's parent, keyed by node index.
fn parent_items(tree: &TraversalTree) -> HashMap<usize, ItemId> {
    let mut parents = HashMap::new();
    for node in tree.iter() {
        for &child in node.children() {
            parents.insert(child.index(), node.item().id);
        }
    }
    parents
}

// ── Properties ───────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_each_item_expanded_at_most_once(spec in graph_spec(), max_depth in depth(), root in 1u64..=8) {
        tokio_test::block_on(async {
            let (store, _) = build_store(&spec).await;
            let Some(root) = store.get_item(ItemId(root)).await.unwrap() else {
                return Ok(());
            };

            for tree in [
                build_impact_tree(store.as_ref(), &root, max_depth).await.unwrap(),
                build_dependency_tree(store.as_ref(), &root, max_depth).await.unwrap(),
            ] {
                let mut expanded = HashSet::new();
                for node in tree.iter().filter(|n| !n.is_circular()) {
                    prop_assert!(
                        expanded.insert(node.item().id),
                        "item {} expanded twice", node.item().id
                    );
                }
                for node in tree.iter().filter(|n| n.is_circular()) {
                    prop_assert!(expanded.contains(&node.item().id));
                    prop_assert!(node.children().is_empty());
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_levels_respect_bound(spec in graph_spec(), max_depth in depth(), root in 1u64..=8) {
        tokio_test::block_on(async {
            let (store, _) = build_store(&spec).await;
            let Some(root) = store.get_item(ItemId(root)).await.unwrap() else {
                return Ok(());
            };

            let tree = build_dependency_tree(store.as_ref(), &root, max_depth).await.unwrap();
            prop_assert_eq!(tree.node(tree.root()).level(), 0);
            for node in tree.iter() {
                prop_assert!(node.level() <= max_depth.get());
                if node.level() == max_depth.get() {
                    prop_assert!(node.children().is_empty());
                }
                for child in node.children() {
                    prop_assert_eq!(tree.node(*child).level(), node.level() + 1);
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_tree_edges_are_followed_graph_edges(spec in graph_spec(), max_depth in depth(), root in 1u64..=8) {
        tokio_test::block_on(async {
            let (store, accepted) = build_store(&spec).await;
            let Some(root) = store.get_item(ItemId(root)).await.unwrap() else {
                return Ok(());
            };
            let edges: HashSet<_> = accepted.into_iter().collect();

            let dependency = build_dependency_tree(store.as_ref(), &root, max_depth).await.unwrap();
            let parents = parent_items(&dependency);
            for (index, node) in dependency.iter().enumerate().skip(1) {
                let parent = parents[&index];
                let relationship_type = node.relationship_type().unwrap();
                prop_assert!(is_followed(relationship_type));
                prop_assert!(edges.contains(&(parent, node.item().id, relationship_type)));
            }

            let impact = build_impact_tree(store.as_ref(), &root, max_depth).await.unwrap();
            let parents = parent_items(&impact);
            for (index, node) in impact.iter().enumerate().skip(1) {
                let parent = parents[&index];
                let relationship_type = node.relationship_type().unwrap();
                prop_assert!(is_followed(relationship_type));
                prop_assert!(edges.contains(&(node.item().id, parent, relationship_type)));
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_first_level_lists_every_direct_neighbor(spec in graph_spec(), root in 1u64..=8) {
        tokio_test::block_on(async {
            let (store, accepted) = build_store(&spec).await;
            let Some(root) = store.get_item(ItemId(root)).await.unwrap() else {
                return Ok(());
            };

            let tree = build_impact_tree(store.as_ref(), &root, MaxDepth::new(1)).await.unwrap();
            let mut listed: Vec<_> = tree
                .children(tree.root())
                .map(|n| (n.item().id, n.relationship_type().unwrap()))
                .collect();
            let mut expected: Vec<_> = accepted
                .iter()
                .filter(|(_, to, t)| *to == root.id && is_followed(*t))
                .map(|(from, _, t)| (*from, *t))
                .collect();
            listed.sort();
            expected.sort();
            prop_assert_eq!(listed, expected);
            Ok(())
        })?;
    }

    #[test]
    fn prop_traversal_is_deterministic(spec in graph_spec(), max_depth in depth(), root in 1u64..=8) {
        tokio_test::block_on(async {
            let (store, _) = build_store(&spec).await;
            let Some(root) = store.get_item(ItemId(root)).await.unwrap() else {
                return Ok(());
            };

            let first = build_impact_tree(store.as_ref(), &root, max_depth).await.unwrap();
            let second = build_impact_tree(store.as_ref(), &root, max_depth).await.unwrap();
            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
            Ok(())
        })?;
    }

    #[test]
    fn prop_summary_counts_add_up(spec in graph_spec(), max_depth in depth(), root in 1u64..=8) {
        tokio_test::block_on(async {
            let (store, _) = build_store(&spec).await;
            let Some(root) = store.get_item(ItemId(root)).await.unwrap() else {
                return Ok(());
            };

            let tree = build_dependency_tree(store.as_ref(), &root, max_depth).await.unwrap();
            let summary = aggregate(&tree);

            prop_assert_eq!(summary.total(), tree.len() - 1);
            prop_assert_eq!(summary.by_category.iter().map(|c| c.count).sum::<usize>(), summary.total());
            prop_assert_eq!(summary.by_level.iter().map(|l| l.count).sum::<usize>(), summary.total());
            prop_assert!(summary.by_level.windows(2).all(|w| w[0].level < w[1].level));
            prop_assert!(summary.nodes.iter().all(|n| n.level >= 1));
            Ok(())
        })?;
    }
}
