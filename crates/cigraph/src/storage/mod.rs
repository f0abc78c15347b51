//! Storage abstraction layer for cigraph.
//!
//! This module provides the relationship store trait the analysis engine
//! queries, and a factory for creating storage backends:
//!
//! - **In-memory**: Fast, ephemeral storage backed by HashMap and petgraph
//! - **JSONL**: The in-memory graph persisted to two JSON Lines files, one for
//!   configuration items and one for relationship edges
//!
//! # Architecture
//!
//! The storage layer uses an async trait so that a relational backend can be
//! dropped in behind the same interface. The trait is object-safe, allowing
//! for dynamic dispatch via `Box<dyn RelationshipStore>`.
//!
//! Configuration items are read-only from the engine's point of view; the
//! store only exposes `import_items` so that a CMDB export can be loaded.
//!
//! # Test Utilities
//!
//! This module provides a [`MockStore`] wrapper that counts edge queries and
//! can be told to fail after a number of them. To use it in your tests, enable
//! the `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! cigraph = { version = "...", features = ["test-util"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cigraph::domain::{CmdbId, ConfigurationItem, ItemId, NewEdge, RelationshipType};
//! use cigraph::storage::{create_storage, RelationshipStore, StorageBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = create_storage(StorageBackend::InMemory).await?;
//!
//!     store
//!         .import_items(vec![
//!             ConfigurationItem {
//!                 id: ItemId(1),
//!                 cmdb_id: CmdbId::new("CI-1"),
//!                 asset_name: "web-01".to_string(),
//!                 asset_category: "Server".to_string(),
//!                 status: "Active".to_string(),
//!             },
//!             ConfigurationItem {
//!                 id: ItemId(2),
//!                 cmdb_id: CmdbId::new("CI-2"),
//!                 asset_name: "db-01".to_string(),
//!                 asset_category: "Database".to_string(),
//!                 status: "Active".to_string(),
//!             },
//!         ])
//!         .await?;
//!
//!     let edge = store
//!         .create_edge(NewEdge {
//!             source_item_id: ItemId(1),
//!             target_item_id: ItemId(2),
//!             relationship_type: RelationshipType::DependsOn,
//!             description: None,
//!             created_by: "alice".to_string(),
//!         })
//!         .await?;
//!     println!("Created relationship {}", edge.id);
//!
//!     Ok(())
//! }
//! ```

use crate::domain::{
    CmdbId, ConfigurationItem, EdgeId, ItemId, Neighbor, NewEdge, RelationshipEdge, TypeFilter,
};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// Storage backend implementations
pub mod in_memory;

#[cfg(any(test, feature = "test-util"))]
mod mock;

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockStore;

/// Core storage trait for the relationship graph.
///
/// This trait defines the narrow query/mutation interface the analysis engine
/// consumes. Implementations must be `Send + Sync` to support concurrent
/// access in async contexts.
///
/// # Method Categories
///
/// - **Items**: `find_item_by_cmdb_id`, `get_item`, `list_items`, `import_items`
/// - **Edge queries**: `list_outgoing_edges`, `list_incoming_edges`, `get_edge`
/// - **Edge mutations**: `create_edge`, `deactivate_edge`
/// - **Batch**: `export_items`, `export_edges`
/// - **Persistence**: `save`, `reload`
///
/// # Edge Direction
///
/// An edge `source -> target` is listed once as an outgoing edge of `source`
/// and once as an incoming edge of `target`. Only active edges are listed.
///
/// # Ordering
///
/// Edge listings carry no ordering guarantee. Callers that need a stable
/// order sort the result themselves.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    // ========== Items ==========

    /// Find a configuration item by its external ID.
    ///
    /// Returns `None` if no item has that ID.
    async fn find_item_by_cmdb_id(&self, cmdb_id: &CmdbId) -> Result<Option<ConfigurationItem>>;

    /// Get a configuration item by its internal ID.
    async fn get_item(&self, id: ItemId) -> Result<Option<ConfigurationItem>>;

    /// List all configuration items, ordered by external ID.
    async fn list_items(&self) -> Result<Vec<ConfigurationItem>>;

    /// Insert or replace configuration items.
    ///
    /// Items are matched by internal ID. Existing relationships of a replaced
    /// item are kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidFormat` if an external ID is already used
    /// by a different internal ID.
    async fn import_items(&mut self, items: Vec<ConfigurationItem>) -> Result<()>;

    // ========== Edge Queries ==========

    /// List items this item points to through active edges matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` if the item doesn't exist.
    async fn list_outgoing_edges(
        &self,
        id: ItemId,
        filter: TypeFilter<'_>,
    ) -> Result<Vec<Neighbor>>;

    /// List items pointing to this item through active edges matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` if the item doesn't exist.
    async fn list_incoming_edges(
        &self,
        id: ItemId,
        filter: TypeFilter<'_>,
    ) -> Result<Vec<Neighbor>>;

    /// Get an edge by ID, active or not.
    async fn get_edge(&self, id: EdgeId) -> Result<Option<RelationshipEdge>>;

    // ========== Edge Mutations ==========

    /// Create a new active edge.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if either item doesn't exist
    /// - `Error::SelfLoop` if source and target are the same item
    /// - `Error::DuplicateRelationship` if an identical active edge exists
    async fn create_edge(&mut self, edge: NewEdge) -> Result<RelationshipEdge>;

    /// Soft-delete an edge by marking it inactive.
    ///
    /// Returns the edge as it is after deactivation.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelationshipNotFound` if the edge doesn't exist or is
    /// already inactive.
    async fn deactivate_edge(&mut self, id: EdgeId) -> Result<RelationshipEdge>;

    // ========== Batch Operations ==========

    /// Export all configuration items.
    async fn export_items(&self) -> Result<Vec<ConfigurationItem>>;

    /// Export all edges, including inactive ones, ordered by edge ID.
    async fn export_edges(&self) -> Result<Vec<RelationshipEdge>>;

    // ========== Persistence ==========

    /// Save changes to persistent storage.
    ///
    /// For in-memory storage this is a no-op. For JSONL-backed storage this
    /// rewrites both data files atomically.
    async fn save(&self) -> Result<()>;

    /// Reload state from persistent storage, discarding in-memory changes.
    ///
    /// No-op for in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns an error if a backing file cannot be read.
    async fn reload(&mut self) -> Result<()>;
}

/// Storage backend configuration.
///
/// Determines which storage implementation to use.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl {
        /// Configuration items file
        items: PathBuf,
        /// Relationship edges file
        relationships: PathBuf,
    },
}

/// Wrapper that adds JSONL file persistence to the in-memory store.
///
/// Reads and writes go to the wrapped store; `save()` writes both data files
/// atomically and `reload()` rebuilds the wrapped store from disk.
struct JsonlBackedStore {
    inner: Box<dyn RelationshipStore>,
    items_path: PathBuf,
    relationships_path: PathBuf,
}

impl JsonlBackedStore {
    async fn open(items_path: PathBuf, relationships_path: PathBuf) -> Result<Self> {
        let inner = load_logging_warnings(&items_path, &relationships_path).await?;
        Ok(Self {
            inner,
            items_path,
            relationships_path,
        })
    }
}

async fn load_logging_warnings(
    items_path: &Path,
    relationships_path: &Path,
) -> Result<Box<dyn RelationshipStore>> {
    let (store, warnings) = in_memory::load_from_jsonl(items_path, relationships_path).await?;
    for warning in &warnings {
        tracing::warn!(%warning, "Skipped record while loading relationship graph");
    }
    Ok(store)
}

#[async_trait]
impl RelationshipStore for JsonlBackedStore {
    async fn find_item_by_cmdb_id(&self, cmdb_id: &CmdbId) -> Result<Option<ConfigurationItem>> {
        self.inner.find_item_by_cmdb_id(cmdb_id).await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<ConfigurationItem>> {
        self.inner.get_item(id).await
    }

    async fn list_items(&self) -> Result<Vec<ConfigurationItem>> {
        self.inner.list_items().await
    }

    async fn import_items(&mut self, items: Vec<ConfigurationItem>) -> Result<()> {
        self.inner.import_items(items).await
    }

    async fn list_outgoing_edges(
        &self,
        id: ItemId,
        filter: TypeFilter<'_>,
    ) -> Result<Vec<Neighbor>> {
        self.inner.list_outgoing_edges(id, filter).await
    }

    async fn list_incoming_edges(
        &self,
        id: ItemId,
        filter: TypeFilter<'_>,
    ) -> Result<Vec<Neighbor>> {
        self.inner.list_incoming_edges(id, filter).await
    }

    async fn get_edge(&self, id: EdgeId) -> Result<Option<RelationshipEdge>> {
        self.inner.get_edge(id).await
    }

    async fn create_edge(&mut self, edge: NewEdge) -> Result<RelationshipEdge> {
        self.inner.create_edge(edge).await
    }

    async fn deactivate_edge(&mut self, id: EdgeId) -> Result<RelationshipEdge> {
        self.inner.deactivate_edge(id).await
    }

    async fn export_items(&self) -> Result<Vec<ConfigurationItem>> {
        self.inner.export_items().await
    }

    async fn export_edges(&self) -> Result<Vec<RelationshipEdge>> {
        self.inner.export_edges().await
    }

    async fn save(&self) -> Result<()> {
        in_memory::save_to_jsonl(
            self.inner.as_ref(),
            &self.items_path,
            &self.relationships_path,
        )
        .await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = load_logging_warnings(&self.items_path, &self.relationships_path).await?;
        Ok(())
    }
}

/// Create a storage backend.
///
/// For [`StorageBackend::Jsonl`], existing data files are loaded; missing
/// files start an empty graph. Records skipped while loading are logged as
/// warnings.
///
/// # Errors
///
/// Returns an error if a data file exists but cannot be read.
pub async fn create_storage(backend: StorageBackend) -> Result<Box<dyn RelationshipStore>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_store()),
        StorageBackend::Jsonl {
            items,
            relationships,
        } => Ok(Box::new(JsonlBackedStore::open(items, relationships).await?)),
    }
}
