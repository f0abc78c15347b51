//! Store wrapper for exercising failure paths in tests.

use super::RelationshipStore;
use crate::domain::{
    CmdbId, ConfigurationItem, EdgeId, ItemId, Neighbor, NewEdge, RelationshipEdge, TypeFilter,
};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A relationship store wrapper for testing.
///
/// `MockStore` delegates every call to a wrapped store while counting edge
/// listing queries. With [`MockStore::fail_after`] it answers that many edge
/// queries and then fails every following one with
/// `StorageError::Unavailable`, which lets tests observe how callers behave
/// when the backend goes away mid-operation. With [`MockStore::fail_saves`]
/// every `save()` fails the same way while `reload()` still reaches the
/// wrapped store.
///
/// # Example
///
/// ```rust,ignore
/// use cigraph::storage::{MockStore, in_memory::new_in_memory_store};
///
/// let store = MockStore::new(new_in_memory_store()).fail_after(2);
/// ```
pub struct MockStore {
    inner: Box<dyn RelationshipStore>,
    fail_after: Option<usize>,
    fail_saves: bool,
    edge_queries: AtomicUsize,
    reloads: usize,
}

impl MockStore {
    /// Wrap a store. No query fails until [`MockStore::fail_after`] is set.
    #[must_use]
    pub fn new(inner: Box<dyn RelationshipStore>) -> Self {
        Self {
            inner,
            fail_after: None,
            fail_saves: false,
            edge_queries: AtomicUsize::new(0),
            reloads: 0,
        }
    }

    /// Fail every edge query after the first `queries` succeed.
    #[must_use]
    pub fn fail_after(mut self, queries: usize) -> Self {
        self.fail_after = Some(queries);
        self
    }

    /// Fail every save.
    #[must_use]
    pub fn fail_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Number of reloads requested so far.
    pub fn reload_count(&self) -> usize {
        self.reloads
    }

    /// Number of edge listing queries issued so far, including failed ones.
    pub fn edge_query_count(&self) -> usize {
        self.edge_queries.load(Ordering::SeqCst)
    }

    fn check_edge_query(&self) -> Result<()> {
        let issued = self.edge_queries.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if issued >= limit => Err(StorageError::Unavailable(format!(
                "mock store configured to fail after {limit} edge queries"
            ))
            .into()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RelationshipStore for MockStore {
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
        self.check_edge_query()?;
        self.inner.list_outgoing_edges(id, filter).await
    }

    async fn list_incoming_edges(
        &self,
        id: ItemId,
        filter: TypeFilter<'_>,
    ) -> Result<Vec<Neighbor>> {
        self.check_edge_query()?;
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
        if self.fail_saves {
            return Err(
                StorageError::Unavailable("mock store configured to fail saves".to_string()).into(),
            );
        }
        self.inner.save().await
    }

    async fn reload(&mut self) -> Result<()> {
        self.reloads += 1;
        self.inner.reload().await
    }
}
