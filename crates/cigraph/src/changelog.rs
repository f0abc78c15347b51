//! Change-history port for relationship mutations.
//!
//! Every successful relationship create or deactivate is reported twice: once
//! against the source item, phrased with the type's label, and once against
//! the target item, phrased with the inverse label. Where the entries end up
//! is decided by the [`ChangeLog`] implementation:
//!
//! - [`TracingChangeLog`]: one structured log event per entry
//! - [`JsonlChangeLog`]: appended to a JSON Lines file
//! - [`RecordingChangeLog`]: kept in memory, for tests and embedding
//! - [`NoopChangeLog`]: dropped
//!
//! Recording is best effort. Callers inspect the returned `Result` and log a
//! failure; they never fail or roll back the mutation because of it.

use crate::domain::{ChangeEntry, ChangeType, ConfigurationItem, RELATIONSHIP_FIELD, RelationshipType};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Destination for change-history entries.
#[async_trait]
pub trait ChangeLog: Send + Sync {
    /// Record one change entry.
    async fn record(&self, entry: ChangeEntry) -> Result<()>;
}

/// Build the source-side and target-side entries for one relationship change.
///
/// For an addition the description goes in `new_value`; for a removal it goes
/// in `old_value`.
#[must_use]
pub fn relationship_change_entries(
    change_type: ChangeType,
    source: &ConfigurationItem,
    target: &ConfigurationItem,
    relationship_type: RelationshipType,
    actor: &str,
) -> [ChangeEntry; 2] {
    let recorded_at = Utc::now();
    let source_side = format!(
        "{}: {} ({})",
        relationship_type.label(),
        target.asset_name,
        target.cmdb_id
    );
    let target_side = format!(
        "{}: {} ({})",
        relationship_type.inverse_label(),
        source.asset_name,
        source.cmdb_id
    );

    let entry = |item: &ConfigurationItem, value: String| {
        let (old_value, new_value) = match change_type {
            ChangeType::RelationshipAdded => (None, Some(value)),
            ChangeType::RelationshipRemoved => (Some(value), None),
        };
        ChangeEntry {
            cmdb_item_id: item.id,
            change_type,
            field_name: RELATIONSHIP_FIELD.to_string(),
            old_value,
            new_value,
            actor: actor.to_string(),
            recorded_at,
        }
    };

    [entry(source, source_side), entry(target, target_side)]
}

/// Emits each entry as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingChangeLog;

#[async_trait]
impl ChangeLog for TracingChangeLog {
    async fn record(&self, entry: ChangeEntry) -> Result<()> {
        tracing::info!(
            item_id = %entry.cmdb_item_id,
            change_type = %entry.change_type,
            field = %entry.field_name,
            old_value = entry.old_value.as_deref().unwrap_or(""),
            new_value = entry.new_value.as_deref().unwrap_or(""),
            actor = %entry.actor,
            "Configuration item changed"
        );
        Ok(())
    }
}

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChangeLog;

#[async_trait]
impl ChangeLog for NoopChangeLog {
    async fn record(&self, _entry: ChangeEntry) -> Result<()> {
        Ok(())
    }
}

/// Appends each entry as one JSON line to a file.
#[derive(Debug, Clone)]
pub struct JsonlChangeLog {
    path: PathBuf,
}

impl JsonlChangeLog {
    /// Create a change log appending to `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ChangeLog for JsonlChangeLog {
    async fn record(&self, entry: ChangeEntry) -> Result<()> {
        let mut line = serde_json::to_string(&entry).map_err(StorageError::Serialization)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Keeps entries in memory.
///
/// Clones share the same entry list, so a test can hand one clone to the
/// service and inspect another.
#[derive(Debug, Default, Clone)]
pub struct RecordingChangeLog {
    entries: Arc<Mutex<Vec<ChangeEntry>>>,
}

impl RecordingChangeLog {
    /// Create an empty recording change log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry recorded so far, in order.
    pub async fn entries(&self) -> Vec<ChangeEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl ChangeLog for RecordingChangeLog {
    async fn record(&self, entry: ChangeEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
