//! RelationshipStore trait implementation for in-memory storage.

use super::InMemoryStore;
use super::graph::{find_active_duplicate, neighbors_impl, remove_graph_edge};
use crate::domain::{
    CmdbId, ConfigurationItem, EdgeId, ItemId, Neighbor, NewEdge, RelationshipEdge, TypeFilter,
};
use crate::error::{Error, Result};
use crate::storage::RelationshipStore;
use async_trait::async_trait;
use chrono::Utc;
use petgraph::Direction;

#[async_trait]
impl RelationshipStore for InMemoryStore {
    async fn find_item_by_cmdb_id(&self, cmdb_id: &CmdbId) -> Result<Option<ConfigurationItem>> {
        let inner = self.lock().await;
        Ok(inner
            .cmdb_index
            .get(cmdb_id)
            .and_then(|id| inner.items.get(id))
            .cloned())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<ConfigurationItem>> {
        let inner = self.lock().await;
        Ok(inner.items.get(&id).cloned())
    }

    async fn list_items(&self) -> Result<Vec<ConfigurationItem>> {
        let inner = self.lock().await;
        let mut items: Vec<ConfigurationItem> = inner.items.values().cloned().collect();
        items.sort_by(|a, b| a.cmdb_id.cmp(&b.cmdb_id));
        Ok(items)
    }

    async fn import_items(&mut self, items: Vec<ConfigurationItem>) -> Result<()> {
        let mut inner = self.lock().await;

        // === Phase 1: Check the whole batch (no mutations) ===
        inner.check_upserts(&items)?;

        // === Phase 2: Apply ===
        for item in items {
            inner.upsert_item(item)?;
        }
        Ok(())
    }

    async fn list_outgoing_edges(
        &self,
        id: ItemId,
        filter: TypeFilter<'_>,
    ) -> Result<Vec<Neighbor>> {
        let inner = self.lock().await;
        neighbors_impl(&inner, id, Direction::Outgoing, filter)
    }

    async fn list_incoming_edges(
        &self,
        id: ItemId,
        filter: TypeFilter<'_>,
    ) -> Result<Vec<Neighbor>> {
        let inner = self.lock().await;
        neighbors_impl(&inner, id, Direction::Incoming, filter)
    }

    async fn get_edge(&self, id: EdgeId) -> Result<Option<RelationshipEdge>> {
        let inner = self.lock().await;
        Ok(inner.edges.get(&id).cloned())
    }

    async fn create_edge(&mut self, new_edge: NewEdge) -> Result<RelationshipEdge> {
        let mut inner = self.lock().await;

        // === Phase 1: All validations (no mutations) ===
        for id in [new_edge.source_item_id, new_edge.target_item_id] {
            if !inner.items.contains_key(&id) {
                return Err(Error::ItemNotFound(id.to_string()));
            }
        }

        if new_edge.source_item_id == new_edge.target_item_id {
            let cmdb_id = inner.items[&new_edge.source_item_id].cmdb_id.clone();
            return Err(Error::SelfLoop(cmdb_id));
        }

        if find_active_duplicate(
            &inner,
            new_edge.source_item_id,
            new_edge.target_item_id,
            new_edge.relationship_type,
        )?
        .is_some()
        {
            return Err(Error::DuplicateRelationship {
                from: new_edge.source_item_id,
                to: new_edge.target_item_id,
                relationship_type: new_edge.relationship_type,
            });
        }

        // === Phase 2: Create edge (all validations passed) ===
        let edge = RelationshipEdge {
            id: inner.allocate_edge_id(),
            source_item_id: new_edge.source_item_id,
            target_item_id: new_edge.target_item_id,
            relationship_type: new_edge.relationship_type,
            description: new_edge.description,
            created_by: new_edge.created_by,
            created_at: Utc::now(),
            is_active: true,
        };
        inner.insert_edge(edge.clone())?;

        Ok(edge)
    }

    async fn deactivate_edge(&mut self, id: EdgeId) -> Result<RelationshipEdge> {
        let mut inner = self.lock().await;

        let source = match inner.edges.get(&id) {
            Some(edge) if edge.is_active => edge.source_item_id,
            _ => return Err(Error::RelationshipNotFound(id)),
        };

        if !remove_graph_edge(&mut inner, source, id)? {
            tracing::warn!(edge_id = %id, "Active edge was missing from the graph");
        }

        let edge = inner
            .edges
            .get_mut(&id)
            .ok_or(Error::RelationshipNotFound(id))?;
        edge.is_active = false;

        Ok(edge.clone())
    }

    async fn export_items(&self) -> Result<Vec<ConfigurationItem>> {
        self.list_items().await
    }

    async fn export_edges(&self) -> Result<Vec<RelationshipEdge>> {
        let inner = self.lock().await;
        Ok(inner.edges.values().cloned().collect())
    }

    async fn save(&self) -> Result<()> {
        // In-memory storage doesn't persist to disk
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        // In-memory storage has no backing store to reload from
        Ok(())
    }
}
