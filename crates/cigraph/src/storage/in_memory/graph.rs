//! Relationship graph operations using petgraph.
//!
//! This module provides the graph-level pieces of the in-memory store:
//! - Neighbor listing in either direction with a type filter
//! - Duplicate active edge detection
//! - Removal of a deactivated edge from the graph

use super::inner::InMemoryStoreInner;
use crate::domain::{EdgeId, ItemId, Neighbor, RelationshipType, TypeFilter};
use crate::error::{Result, StorageError};
use petgraph::Direction;
use petgraph::visit::EdgeRef;

/// List the items across active edges of `id` in the given direction.
///
/// - `Direction::Outgoing`: items `id` points to (edge targets)
/// - `Direction::Incoming`: items pointing to `id` (edge sources)
pub(super) fn neighbors_impl(
    inner: &InMemoryStoreInner,
    id: ItemId,
    direction: Direction,
    filter: TypeFilter<'_>,
) -> Result<Vec<Neighbor>> {
    let node = inner.node(id)?;
    let mut neighbors = Vec::new();

    for edge_ref in inner.graph.edges_directed(node, direction) {
        let edge_id = *edge_ref.weight();
        let edge = inner.edges.get(&edge_id).ok_or_else(|| {
            StorageError::Inconsistent(format!("graph edge {edge_id} has no record"))
        })?;

        if !filter.matches(edge.relationship_type) {
            continue;
        }

        let other_node = match direction {
            Direction::Outgoing => edge_ref.target(),
            Direction::Incoming => edge_ref.source(),
        };
        let other = inner.item_for_edge(inner.graph[other_node])?;

        neighbors.push(Neighbor {
            edge_id,
            item: other.clone(),
            relationship_type: edge.relationship_type,
            description: edge.description.clone(),
        });
    }

    Ok(neighbors)
}

/// Find an active edge with the same source, target and type.
///
/// Several active edges may connect the same pair of items as long as their
/// types differ, so every edge between the two nodes is checked.
pub(super) fn find_active_duplicate(
    inner: &InMemoryStoreInner,
    from: ItemId,
    to: ItemId,
    relationship_type: RelationshipType,
) -> Result<Option<EdgeId>> {
    let from_node = inner.node(from)?;
    let to_node = inner.node(to)?;

    Ok(inner
        .graph
        .edges_connecting(from_node, to_node)
        .map(|edge_ref| *edge_ref.weight())
        .find(|edge_id| {
            inner
                .edges
                .get(edge_id)
                .is_some_and(|edge| edge.relationship_type == relationship_type)
        }))
}

/// Remove the graph edge carrying `edge_id`.
///
/// Returns `false` if no graph edge carries that ID (the edge was not active).
pub(super) fn remove_graph_edge(
    inner: &mut InMemoryStoreInner,
    from: ItemId,
    edge_id: EdgeId,
) -> Result<bool> {
    let from_node = inner.node(from)?;
    let found = inner
        .graph
        .edges(from_node)
        .find(|edge_ref| *edge_ref.weight() == edge_id)
        .map(|edge_ref| edge_ref.id());

    match found {
        Some(index) => {
            inner.graph.remove_edge(index);
            Ok(true)
        }
        None => Ok(false),
    }
}
