//! Implementation of the `import` command.
//!
//! Configuration items are owned by the wider CMDB; this command loads an
//! export of them, one JSON object per line, into the workspace. Unlike the
//! workspace data files, an import file is read strictly: the first malformed
//! line aborts the import so that a truncated export is never half-applied.

use crate::domain::ConfigurationItem;
use crate::error::{Result, StorageError};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read configuration items from a JSONL export.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns `StorageError::InvalidFormat` naming the line number of the first
/// line that is not a valid item, or an IO error if the file can't be read.
pub async fn read_items(path: &Path) -> Result<Vec<ConfigurationItem>> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut items = Vec::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| {
            StorageError::InvalidFormat(format!("{}:{line_number}: {e}", path.display()))
        })?;
        items.push(item);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_items_skips_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("export.jsonl");
        tokio::fs::write(
            &path,
            concat!(
                r#"{"id":1,"cmdbId":"CI-1","assetName":"web-01","assetCategory":"Server","status":"Active"}"#,
                "\n\n",
                r#"{"id":2,"cmdbId":"CI-2","assetName":"db-01","assetCategory":"Database","status":"Active"}"#,
                "\n"
            ),
        )
        .await
        .unwrap();

        let items = read_items(&path).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].asset_name, "db-01");
    }

    #[tokio::test]
    async fn test_read_items_reports_line_of_bad_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("export.jsonl");
        tokio::fs::write(
            &path,
            concat!(
                r#"{"id":1,"cmdbId":"CI-1","assetName":"web-01","assetCategory":"Server","status":"Active"}"#,
                "\n",
                r#"{"id":2,"cmdbId":"CI-2"}"#,
                "\n"
            ),
        )
        .await
        .unwrap();

        let err = read_items(&path).await.unwrap_err();

        assert_eq!(err.code(), "store_error");
        assert!(err.to_string().contains(":2:"));
    }
}
