//! Relationship service: the operations exposed to callers.
//!
//! [`RelationshipService`] ties a [`RelationshipStore`] to a [`ChangeLog`].
//! It runs impact and dependency analyses, validates and applies relationship
//! mutations, and reports each mutation to the change log.
//!
//! Each mutation is saved before it is recorded. When the save fails the
//! store is reloaded from its last saved state, the mutation is reported as
//! failed and nothing reaches the change log.

use crate::changelog::{ChangeLog, relationship_change_entries};
use crate::domain::{
    ChangeEntry, ChangeType, CmdbId, ConfigurationItem, EdgeId, ItemId, Neighbor, NewEdge,
    RelationshipEdge, RelationshipRequest, RelationshipType, RelationshipTypeInfo, TypeFilter,
};
use crate::error::{Error, Result, StorageError};
use crate::report::{CategoryCount, FlatNode, LevelCount, aggregate};
use crate::storage::RelationshipStore;
use crate::traversal::{MaxDepth, TraversalTree, build_dependency_tree, build_impact_tree};
use serde::Serialize;

/// Summary counts of an impact analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    /// Number of non-root nodes, circular leaves included
    pub total_impacted: usize,
    /// Counts by category
    pub by_category: Vec<CategoryCount>,
    /// Counts by level
    pub by_level: Vec<LevelCount>,
}

/// Result of an impact analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Item the analysis started from
    pub root: ConfigurationItem,
    /// Effective depth bound
    pub max_depth: MaxDepth,
    /// Nested tree of affected items
    pub tree: TraversalTree,
    /// Counts
    pub summary: ImpactSummary,
    /// Affected items in pre-order
    pub impacted_items: Vec<FlatNode>,
}

/// Summary counts of a dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySummary {
    /// Number of non-root nodes, circular leaves included
    pub total_dependencies: usize,
    /// Counts by category
    pub by_category: Vec<CategoryCount>,
    /// Counts by level
    pub by_level: Vec<LevelCount>,
}

/// Result of a dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    /// Item the analysis started from
    pub root: ConfigurationItem,
    /// Effective depth bound
    pub max_depth: MaxDepth,
    /// Nested tree of required items
    pub tree: TraversalTree,
    /// Counts
    pub summary: DependencySummary,
    /// Required items in pre-order
    pub dependencies: Vec<FlatNode>,
}

/// One active relationship seen from one of its ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipView {
    /// Edge ID
    pub id: EdgeId,
    /// Relationship type
    pub relationship_type: RelationshipType,
    /// Label for outgoing edges, inverse label for incoming ones
    pub label: &'static str,
    /// Item at the other end
    pub related_item: ConfigurationItem,
    /// Edge description
    pub description: Option<String>,
}

/// Every active relationship of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRelationships {
    /// The item
    pub item: ConfigurationItem,
    /// Edges starting at the item
    pub outgoing: Vec<RelationshipView>,
    /// Edges ending at the item
    pub incoming: Vec<RelationshipView>,
}

/// Relationship graph operations over a store and a change log.
pub struct RelationshipService {
    store: Box<dyn RelationshipStore>,
    change_log: Box<dyn ChangeLog>,
}

impl RelationshipService {
    /// Create a service.
    pub fn new(store: Box<dyn RelationshipStore>, change_log: Box<dyn ChangeLog>) -> Self {
        Self { store, change_log }
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn RelationshipStore {
        self.store.as_ref()
    }

    /// Look up an item by external ID, failing if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` if no item has that ID.
    pub async fn require_item(&self, cmdb_id: &CmdbId) -> Result<ConfigurationItem> {
        self.store
            .find_item_by_cmdb_id(cmdb_id)
            .await?
            .ok_or_else(|| Error::ItemNotFound(cmdb_id.to_string()))
    }

    /// What is affected if `cmdb_id` fails.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` for an unknown root, or the first store
    /// error raised during the traversal.
    pub async fn impact_analysis(
        &self,
        cmdb_id: &CmdbId,
        max_depth: MaxDepth,
    ) -> Result<ImpactReport> {
        let root = self.require_item(cmdb_id).await?;
        let tree = build_impact_tree(self.store.as_ref(), &root, max_depth).await?;
        let aggregate = aggregate(&tree);

        Ok(ImpactReport {
            root,
            max_depth,
            summary: ImpactSummary {
                total_impacted: aggregate.total(),
                by_category: aggregate.by_category,
                by_level: aggregate.by_level,
            },
            impacted_items: aggregate.nodes,
            tree,
        })
    }

    /// What `cmdb_id` depends on.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` for an unknown root, or the first store
    /// error raised during the traversal.
    pub async fn dependency_analysis(
        &self,
        cmdb_id: &CmdbId,
        max_depth: MaxDepth,
    ) -> Result<DependencyReport> {
        let root = self.require_item(cmdb_id).await?;
        let tree = build_dependency_tree(self.store.as_ref(), &root, max_depth).await?;
        let aggregate = aggregate(&tree);

        Ok(DependencyReport {
            root,
            max_depth,
            summary: DependencySummary {
                total_dependencies: aggregate.total(),
                by_category: aggregate.by_category,
                by_level: aggregate.by_level,
            },
            dependencies: aggregate.nodes,
            tree,
        })
    }

    /// Validate and create a relationship, then record it on both items.
    ///
    /// Checks run in this order: type name, self-loop, item lookups, then the
    /// store's duplicate check.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidRelationshipType` for an unregistered type name
    /// - `Error::SelfLoop` if source and target are the same item
    /// - `Error::ItemNotFound` if either item doesn't exist
    /// - `Error::DuplicateRelationship` if the same active edge exists
    /// - the store's error if the new edge cannot be saved
    pub async fn create_relationship(
        &mut self,
        request: RelationshipRequest,
        actor: &str,
    ) -> Result<RelationshipEdge> {
        let relationship_type: RelationshipType = request.relationship_type.parse()?;
        if request.source_cmdb_id == request.target_cmdb_id {
            return Err(Error::SelfLoop(request.source_cmdb_id));
        }

        let source = self.require_item(&request.source_cmdb_id).await?;
        let target = self.require_item(&request.target_cmdb_id).await?;

        let edge = self
            .store
            .create_edge(NewEdge {
                source_item_id: source.id,
                target_item_id: target.id,
                relationship_type,
                description: request.description,
                created_by: actor.to_string(),
            })
            .await?;
        self.commit().await?;

        tracing::info!(
            edge_id = %edge.id,
            source = %source.cmdb_id,
            target = %target.cmdb_id,
            %relationship_type,
            actor,
            "Created relationship"
        );

        self.record_changes(relationship_change_entries(
            ChangeType::RelationshipAdded,
            &source,
            &target,
            relationship_type,
            actor,
        ))
        .await;

        Ok(edge)
    }

    /// Deactivate a relationship, then record the removal on both items.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelationshipNotFound` if the edge doesn't exist or is
    /// already inactive, or the store's error if the removal cannot be saved.
    pub async fn delete_relationship(
        &mut self,
        edge_id: EdgeId,
        actor: &str,
    ) -> Result<RelationshipEdge> {
        let edge = self
            .store
            .get_edge(edge_id)
            .await?
            .filter(|edge| edge.is_active)
            .ok_or(Error::RelationshipNotFound(edge_id))?;

        let source = self.edge_end(&edge, edge.source_item_id).await?;
        let target = self.edge_end(&edge, edge.target_item_id).await?;

        let edge = self.store.deactivate_edge(edge_id).await?;
        self.commit().await?;

        tracing::info!(
            edge_id = %edge.id,
            source = %source.cmdb_id,
            target = %target.cmdb_id,
            relationship_type = %edge.relationship_type,
            actor,
            "Removed relationship"
        );

        self.record_changes(relationship_change_entries(
            ChangeType::RelationshipRemoved,
            &source,
            &target,
            edge.relationship_type,
            actor,
        ))
        .await;

        Ok(edge)
    }

    /// Every active relationship of an item, with display labels.
    ///
    /// Both lists are ordered by label, then by the related item's name.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` if the item doesn't exist.
    pub async fn item_relationships(&self, cmdb_id: &CmdbId) -> Result<ItemRelationships> {
        let item = self.require_item(cmdb_id).await?;

        let view = |neighbor: Neighbor, label: &'static str| RelationshipView {
            id: neighbor.edge_id,
            relationship_type: neighbor.relationship_type,
            label,
            related_item: neighbor.item,
            description: neighbor.description,
        };

        let mut outgoing: Vec<_> = self
            .store
            .list_outgoing_edges(item.id, TypeFilter::Any)
            .await?
            .into_iter()
            .map(|n| {
                let label = n.relationship_type.label();
                view(n, label)
            })
            .collect();
        let mut incoming: Vec<_> = self
            .store
            .list_incoming_edges(item.id, TypeFilter::Any)
            .await?
            .into_iter()
            .map(|n| {
                let label = n.relationship_type.inverse_label();
                view(n, label)
            })
            .collect();

        for list in [&mut outgoing, &mut incoming] {
            list.sort_by(|a, b| {
                a.label
                    .cmp(b.label)
                    .then_with(|| a.related_item.asset_name.cmp(&b.related_item.asset_name))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        Ok(ItemRelationships {
            item,
            outgoing,
            incoming,
        })
    }

    /// The relationship type registry.
    #[must_use]
    pub fn relationship_types() -> &'static [RelationshipTypeInfo] {
        RelationshipType::registry()
    }

    /// Every configuration item, ordered by external ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_items(&self) -> Result<Vec<ConfigurationItem>> {
        self.store.list_items().await
    }

    /// Insert or replace configuration items. Returns the number imported.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidFormat` if an external ID is claimed by
    /// two different internal IDs, or the store's error if saving fails. No
    /// item is imported in either case.
    pub async fn import_items(&mut self, items: Vec<ConfigurationItem>) -> Result<usize> {
        let count = items.len();
        self.store.import_items(items).await?;
        self.commit().await?;
        tracing::info!(count, "Imported configuration items");
        Ok(count)
    }

    /// Persist the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing files cannot be written.
    pub async fn save(&self) -> Result<()> {
        self.store.save().await
    }

    async fn commit(&mut self) -> Result<()> {
        if let Err(error) = self.save().await {
            if let Err(reload_error) = self.store.reload().await {
                tracing::warn!(%reload_error, "Failed to reload after save error");
            }
            return Err(error);
        }
        Ok(())
    }

    async fn edge_end(&self, edge: &RelationshipEdge, id: ItemId) -> Result<ConfigurationItem> {
        self.store.get_item(id).await?.ok_or_else(|| {
            StorageError::Inconsistent(format!(
                "relationship {} references missing item {id}",
                edge.id
            ))
            .into()
        })
    }

    async fn record_changes(&self, entries: [ChangeEntry; 2]) {
        for entry in entries {
            let item_id = entry.cmdb_item_id;
            if let Err(error) = self.change_log.record(entry).await {
                tracing::warn!(%item_id, %error, "Failed to record relationship change");
            }
        }
    }
}

impl std::fmt::Debug for RelationshipService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipService")
            .field("store", &"<dyn RelationshipStore>")
            .field("change_log", &"<dyn ChangeLog>")
            .finish()
    }
}
