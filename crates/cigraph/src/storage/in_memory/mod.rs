//! In-memory storage backend using HashMap and petgraph.
//!
//! This module provides a fast, **ephemeral** storage implementation where all data
//! is held in RAM and **lost when the process exits** unless it is written out
//! with [`save_to_jsonl`].
//!
//! # Architecture
//!
//! The implementation uses:
//! - `HashMap<ItemId, ConfigurationItem>` for O(1) item lookups
//! - `HashMap<CmdbId, ItemId>` for lookups by external ID
//! - `BTreeMap<EdgeId, RelationshipEdge>` holding every edge ever created,
//!   active or not, in ID order
//! - `petgraph::DiGraph<ItemId, EdgeId>` holding only the **active** edges
//! - `HashMap<ItemId, NodeIndex>` for mapping items to graph nodes
//!
//! ## Edge Direction Convention
//!
//! Graph edges point from the relationship **source** to its **target**, the
//! same direction the relationship reads:
//!
//! - `web-01 depends_on db-01` is stored as `web-01 -> db-01`
//! - `vm-07 hosts api-03` is stored as `vm-07 -> api-03`
//!
//! Outgoing edges of a node are what it points to; incoming edges are what
//! points to it. Edge weights are [`EdgeId`](crate::domain::EdgeId)s that key
//! into the edge table, so the graph never duplicates edge data.
//!
//! ## Soft Deletion
//!
//! Deactivating an edge flips `is_active` in the edge table and removes the
//! graph edge. The record itself is kept for history and persisted.
//!
//! # Thread Safety
//!
//! The storage is wrapped in `Arc<Mutex<InMemoryStoreInner>>` to provide thread-safe
//! access in async contexts. Each operation acquires the mutex for its own
//! duration only.
//!
//! # Performance Characteristics
//!
//! - Item lookup: O(1) by internal or external ID
//! - Edge listing: O(d) where d is the degree of the node
//! - Create edge: O(d) for the duplicate check
//! - Deactivate edge: O(d) to locate the graph edge

mod graph;
mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::RelationshipStore;
use inner::InMemoryStoreInner;
use std::sync::Arc;
use tokio::sync::Mutex;

// Re-export public API
pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Thread-safe in-memory storage.
///
/// This type alias wraps the inner storage in `Arc<Mutex<>>` for thread-safe
/// async access. It implements [`RelationshipStore`] via the trait implementation
/// in `trait_impl.rs`.
pub(crate) type InMemoryStore = Arc<Mutex<InMemoryStoreInner>>;

/// Create a new, empty in-memory store.
///
/// # Example
///
/// ```
/// use cigraph::storage::in_memory::new_in_memory_store;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_in_memory_store();
///     // Import items, create relationships...
/// }
/// ```
#[must_use]
pub fn new_in_memory_store() -> Box<dyn RelationshipStore> {
    Box::new(Arc::new(Mutex::new(InMemoryStoreInner::new())))
}
