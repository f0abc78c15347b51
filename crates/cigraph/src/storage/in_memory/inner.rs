//! Core in-memory storage data structures.
//!
//! This module contains the inner storage structure that holds all data
//! and is wrapped in `Arc<Mutex<>>` for thread safety.

use crate::domain::{CmdbId, ConfigurationItem, EdgeId, ItemId, RelationshipEdge};
use crate::error::{Error, Result, StorageError};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};

/// Inner storage structure (not thread-safe).
///
/// # Invariants
///
/// - Every item in `items` has exactly one entry in `cmdb_index` and `node_map`
/// - Every active edge in `edges` has exactly one graph edge weighted with its ID
/// - `next_edge_id` is greater than every ID in `edges`
pub(crate) struct InMemoryStoreInner {
    /// Items indexed by internal ID
    pub(super) items: HashMap<ItemId, ConfigurationItem>,

    /// External ID to internal ID
    pub(super) cmdb_index: HashMap<CmdbId, ItemId>,

    /// Every edge, active or not, in ID order
    pub(super) edges: BTreeMap<EdgeId, RelationshipEdge>,

    /// Active edges only.
    ///
    /// Nodes contain `ItemId` values, edges contain the `EdgeId` of the record
    /// in `edges`. Edge direction: relationship source -> relationship target.
    pub(super) graph: DiGraph<ItemId, EdgeId>,

    /// Mapping from ItemId to graph NodeIndex.
    pub(super) node_map: HashMap<ItemId, NodeIndex>,

    /// Next edge ID to hand out
    next_edge_id: u64,
}

impl InMemoryStoreInner {
    /// Create a new empty storage instance
    pub(crate) fn new() -> Self {
        Self {
            items: HashMap::new(),
            cmdb_index: HashMap::new(),
            edges: BTreeMap::new(),
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            next_edge_id: 1,
        }
    }

    /// Check that a batch of upserts can be applied in order, without applying it.
    ///
    /// Ownership of external IDs is tracked as each upsert would leave it, so
    /// an item may take over an ID that an earlier item in the batch released.
    pub(super) fn check_upserts(&self, items: &[ConfigurationItem]) -> Result<()> {
        let mut owners: HashMap<&CmdbId, Option<ItemId>> = HashMap::new();
        let mut renamed: HashMap<ItemId, &CmdbId> = HashMap::new();

        for item in items {
            let owner = match owners.get(&item.cmdb_id) {
                Some(owner) => *owner,
                None => self.cmdb_index.get(&item.cmdb_id).copied(),
            };
            if let Some(owner) = owner.filter(|owner| *owner != item.id) {
                return Err(external_id_taken(&item.cmdb_id, owner));
            }

            let previous = match renamed.get(&item.id) {
                Some(previous) => Some(*previous),
                None => self.items.get(&item.id).map(|p| &p.cmdb_id),
            };
            if let Some(previous) = previous.filter(|p| **p != item.cmdb_id) {
                owners.insert(previous, None);
            }
            owners.insert(&item.cmdb_id, Some(item.id));
            renamed.insert(item.id, &item.cmdb_id);
        }
        Ok(())
    }

    /// Insert or replace an item, keeping its graph node and edges.
    pub(super) fn upsert_item(&mut self, item: ConfigurationItem) -> Result<()> {
        if let Some(&owner) = self.cmdb_index.get(&item.cmdb_id) {
            if owner != item.id {
                return Err(external_id_taken(&item.cmdb_id, owner));
            }
        }

        if let Some(previous) = self.items.get(&item.id) {
            if previous.cmdb_id != item.cmdb_id {
                self.cmdb_index.remove(&previous.cmdb_id);
            }
        }

        if !self.node_map.contains_key(&item.id) {
            let node = self.graph.add_node(item.id);
            self.node_map.insert(item.id, node);
        }

        self.cmdb_index.insert(item.cmdb_id.clone(), item.id);
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Graph node of an item.
    pub(super) fn node(&self, id: ItemId) -> Result<NodeIndex> {
        self.node_map
            .get(&id)
            .copied()
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    /// Look up an item that a graph node or edge refers to.
    ///
    /// A miss means the indexes disagree, which is a store fault rather than a
    /// caller error.
    pub(super) fn item_for_edge(&self, id: ItemId) -> Result<&ConfigurationItem> {
        self.items.get(&id).ok_or_else(|| {
            StorageError::Inconsistent(format!("graph references unknown item {id}")).into()
        })
    }

    /// Hand out the next edge ID.
    pub(super) fn allocate_edge_id(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        id
    }

    /// Store an edge record, adding it to the graph when active.
    ///
    /// Callers are responsible for validation; this only maintains indexes.
    pub(super) fn insert_edge(&mut self, edge: RelationshipEdge) -> Result<()> {
        if edge.is_active {
            let from = self.node(edge.source_item_id)?;
            let to = self.node(edge.target_item_id)?;
            self.graph.add_edge(from, to, edge.id);
        }
        self.next_edge_id = self.next_edge_id.max(edge.id.0 + 1);
        self.edges.insert(edge.id, edge);
        Ok(())
    }
}

fn external_id_taken(cmdb_id: &CmdbId, owner: ItemId) -> Error {
    StorageError::InvalidFormat(format!("external ID {cmdb_id} already belongs to item {owner}"))
        .into()
}
