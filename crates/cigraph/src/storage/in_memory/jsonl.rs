//! JSONL persistence for in-memory storage.
//!
//! The graph is persisted as two JSON Lines files: one
//! [`ConfigurationItem`] per line in the items file and one
//! [`RelationshipEdge`] per line in the relationships file. Inactive edges are
//! written too, so soft-deleted relationships survive a save/load cycle.

use super::graph::find_active_duplicate;
use super::inner::InMemoryStoreInner;
use crate::domain::{ConfigurationItem, EdgeId, ItemId, RelationshipEdge};
use crate::error::{Error, Result, StorageError};
use crate::storage::RelationshipStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;

/// Warnings that can occur during JSONL file loading.
///
/// These are non-fatal issues that don't prevent loading but indicate
/// data quality problems. The offending record is skipped and loading
/// continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Malformed JSON line that couldn't be parsed
    ///
    /// **Effect**: Line is skipped entirely.
    MalformedJson {
        /// File the line was read from
        file: String,
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// Item whose internal or external ID was already loaded
    ///
    /// **Effect**: The later record is skipped; the first one wins.
    DuplicateItem {
        /// 1-based line number in the items file
        line_number: usize,
        /// Parser or index message
        error: String,
    },

    /// Edge referencing an item that doesn't exist
    ///
    /// **Effect**: The edge is skipped.
    OrphanedRelationship {
        /// Edge ID
        edge_id: EdgeId,
        /// Missing item
        item_id: ItemId,
    },

    /// Edge whose source and target are the same item
    ///
    /// **Effect**: The edge is skipped.
    SelfLoop {
        /// Edge ID
        edge_id: EdgeId,
    },

    /// Edge ID used by an earlier record
    ///
    /// **Effect**: The later record is skipped.
    DuplicateEdgeId {
        /// Edge ID
        edge_id: EdgeId,
    },

    /// Second active edge for the same `(source, target, type)`
    ///
    /// **Effect**: The later edge is loaded as inactive.
    DuplicateActiveRelationship {
        /// Edge ID of the demoted record
        edge_id: EdgeId,
        /// Edge ID of the active record it duplicates
        existing: EdgeId,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MalformedJson {
                file,
                line_number,
                error,
            } => write!(f, "{file}:{line_number}: malformed JSON: {error}"),
            LoadWarning::DuplicateItem { line_number, error } => {
                write!(f, "items line {line_number}: duplicate item: {error}")
            }
            LoadWarning::OrphanedRelationship { edge_id, item_id } => {
                write!(f, "relationship {edge_id} references missing item {item_id}")
            }
            LoadWarning::SelfLoop { edge_id } => {
                write!(f, "relationship {edge_id} relates an item to itself")
            }
            LoadWarning::DuplicateEdgeId { edge_id } => {
                write!(f, "relationship ID {edge_id} appears more than once")
            }
            LoadWarning::DuplicateActiveRelationship { edge_id, existing } => write!(
                f,
                "relationship {edge_id} duplicates active relationship {existing}; loaded as inactive"
            ),
        }
    }
}

/// Read a JSONL file, skipping malformed lines.
///
/// A missing file reads as empty. Blank lines are ignored.
async fn read_records<T: DeserializeOwned>(
    path: &Path,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Vec<(usize, T)>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Data file not found, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let mut lines = BufReader::new(file).lines();
    let mut records = Vec::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push((line_number, record)),
            Err(e) => warnings.push(LoadWarning::MalformedJson {
                file: path.display().to_string(),
                line_number,
                error: e.to_string(),
            }),
        }
    }

    Ok(records)
}

/// Load storage from a pair of JSONL files.
///
/// # Error Handling
///
/// - **Malformed JSON**: line skipped, warning added
/// - **Duplicate items**: later record skipped, warning added
/// - **Orphaned edges / self-loops / reused edge IDs**: edge skipped, warning added
/// - **Duplicate active edges**: later edge loaded as inactive, warning added
///
/// Edges are loaded in ID order so that the surviving duplicate is always
/// the oldest one. The next edge ID continues after the highest loaded ID.
///
/// # Returns
///
/// Returns a tuple of `(store, warnings)`.
pub async fn load_from_jsonl(
    items_path: &Path,
    relationships_path: &Path,
) -> Result<(Box<dyn RelationshipStore>, Vec<LoadWarning>)> {
    let mut warnings = Vec::new();

    let items: Vec<(usize, ConfigurationItem)> = read_records(items_path, &mut warnings).await?;
    let mut edges: Vec<(usize, RelationshipEdge)> =
        read_records(relationships_path, &mut warnings).await?;

    let mut inner = InMemoryStoreInner::new();

    // First pass: items and graph nodes
    for (line_number, item) in items {
        if inner.items.contains_key(&item.id) {
            warnings.push(LoadWarning::DuplicateItem {
                line_number,
                error: format!("internal ID {} already loaded", item.id),
            });
            continue;
        }
        if let Err(e) = inner.upsert_item(item) {
            warnings.push(LoadWarning::DuplicateItem {
                line_number,
                error: e.to_string(),
            });
        }
    }

    // Second pass: edges, oldest first
    edges.sort_by_key(|(_, edge)| edge.id);
    for (_, mut edge) in edges {
        if inner.edges.contains_key(&edge.id) {
            warnings.push(LoadWarning::DuplicateEdgeId { edge_id: edge.id });
            continue;
        }

        if let Some(missing) = [edge.source_item_id, edge.target_item_id]
            .into_iter()
            .find(|id| !inner.items.contains_key(id))
        {
            warnings.push(LoadWarning::OrphanedRelationship {
                edge_id: edge.id,
                item_id: missing,
            });
            continue;
        }

        if edge.source_item_id == edge.target_item_id {
            warnings.push(LoadWarning::SelfLoop { edge_id: edge.id });
            continue;
        }

        if edge.is_active {
            if let Some(existing) = find_active_duplicate(
                &inner,
                edge.source_item_id,
                edge.target_item_id,
                edge.relationship_type,
            )? {
                warnings.push(LoadWarning::DuplicateActiveRelationship {
                    edge_id: edge.id,
                    existing,
                });
                edge.is_active = false;
            }
        }

        inner.insert_edge(edge)?;
    }

    Ok((Box::new(Arc::new(Mutex::new(inner))), warnings))
}

/// Write records to `path` atomically, one JSON document per line.
///
/// Writes to a temporary file first, then renames it over the target, so a
/// crash mid-write leaves the original file intact.
async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let file = File::create(&temp_path).await?;
    let mut writer = BufWriter::new(file);

    for record in records {
        let json = serde_json::to_string(record).map_err(StorageError::Serialization)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    tokio::fs::rename(&temp_path, path).await?;

    Ok(())
}

/// Save storage to a pair of JSONL files with atomic writes.
///
/// Items are written ordered by external ID and edges by edge ID, so repeated
/// saves of the same graph produce identical files.
pub async fn save_to_jsonl(
    store: &dyn RelationshipStore,
    items_path: &Path,
    relationships_path: &Path,
) -> Result<()> {
    let items = store.export_items().await?;
    let edges = store.export_edges().await?;

    write_records(items_path, &items).await?;
    write_records(relationships_path, &edges).await?;

    tracing::debug!(
        items = items.len(),
        relationships = edges.len(),
        "Saved relationship graph"
    );

    Ok(())
}
