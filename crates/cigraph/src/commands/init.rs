//! Implementation of the `init` command and workspace configuration.
//!
//! A cigraph workspace is a directory containing `.cigraph/`, which holds the
//! configuration file and the JSONL data files for items, relationships and
//! the change history.

use crate::changelog::{ChangeLog, JsonlChangeLog, NoopChangeLog, TracingChangeLog};
use crate::error::{ConfigError, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Name of the cigraph directory
pub const CIGRAPH_DIR_NAME: &str = ".cigraph";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the configuration items data file
pub const ITEMS_FILE_NAME: &str = "items.jsonl";

/// Name of the relationships data file
pub const RELATIONSHIPS_FILE_NAME: &str = "relationships.jsonl";

/// Name of the change history file
pub const CHANGES_FILE_NAME: &str = "changes.jsonl";

/// Name of the gitignore file within .cigraph
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

const STORAGE_BACKENDS: &str = "jsonl, memory";
const CHANGELOG_BACKENDS: &str = "jsonl, tracing, none";

/// Configuration file structure for cigraph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CigraphConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Change history configuration
    #[serde(default)]
    pub changelog: ChangeLogConfig,

    /// Default actor recorded on relationship changes
    #[serde(default)]
    pub actor: Option<String>,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Storage backend type: "jsonl" or "memory"
    pub backend: String,

    /// Items file, relative to the workspace root
    pub items_file: String,

    /// Relationships file, relative to the workspace root
    pub relationships_file: String,
}

/// Change history configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ChangeLogConfig {
    /// Change log backend: "jsonl", "tracing" or "none"
    pub backend: String,

    /// Change history file for the "jsonl" backend, relative to the workspace root
    pub file: String,
}

impl Default for ChangeLogConfig {
    fn default() -> Self {
        Self {
            backend: "jsonl".to_string(),
            file: format!("{CIGRAPH_DIR_NAME}/{CHANGES_FILE_NAME}"),
        }
    }
}

impl Default for CigraphConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                backend: "jsonl".to_string(),
                items_file: format!("{CIGRAPH_DIR_NAME}/{ITEMS_FILE_NAME}"),
                relationships_file: format!("{CIGRAPH_DIR_NAME}/{RELATIONSHIPS_FILE_NAME}"),
            },
            changelog: ChangeLogConfig::default(),
            actor: None,
        }
    }
}

impl CigraphConfig {
    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check backend names and data file paths.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.storage.backend.as_str(), "jsonl" | "memory") {
            return Err(ConfigError::UnsupportedValue {
                field: "storage backend",
                value: self.storage.backend.clone(),
                valid_values: STORAGE_BACKENDS,
            }
            .into());
        }
        if !matches!(self.changelog.backend.as_str(), "jsonl" | "tracing" | "none") {
            return Err(ConfigError::UnsupportedValue {
                field: "changelog backend",
                value: self.changelog.backend.clone(),
                valid_values: CHANGELOG_BACKENDS,
            }
            .into());
        }

        validate_data_path("items-file", &self.storage.items_file)?;
        validate_data_path("relationships-file", &self.storage.relationships_file)?;
        validate_data_path("changelog file", &self.changelog.file)?;
        Ok(())
    }

    /// Resolve the storage backend against the workspace root.
    pub fn storage_backend(&self, root_dir: &Path) -> StorageBackend {
        match self.storage.backend.as_str() {
            "memory" => StorageBackend::InMemory,
            _ => StorageBackend::Jsonl {
                items: root_dir.join(&self.storage.items_file),
                relationships: root_dir.join(&self.storage.relationships_file),
            },
        }
    }

    /// Build the configured change log.
    pub fn change_log(&self, root_dir: &Path) -> Box<dyn ChangeLog> {
        match self.changelog.backend.as_str() {
            "none" => Box::new(NoopChangeLog),
            "tracing" => Box::new(TracingChangeLog),
            _ => Box::new(JsonlChangeLog::new(root_dir.join(&self.changelog.file))),
        }
    }
}

/// Data files must stay inside the workspace.
fn validate_data_path(field: &str, path: &str) -> Result<()> {
    let path = Path::new(path);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes || path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "{field} must be a relative path inside the workspace, got '{}'",
            path.display()
        ))
        .into());
    }
    Ok(())
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created .cigraph directory
    pub cigraph_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created items file
    pub items_file: PathBuf,
    /// Path to the created relationships file
    pub relationships_file: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
}

/// Initialize a new cigraph workspace in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.cigraph/` directory already exists
/// - File system operations fail
pub async fn init(base_dir: &Path) -> Result<InitResult> {
    let cigraph_dir = base_dir.join(CIGRAPH_DIR_NAME);

    if cigraph_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(cigraph_dir).into());
    }

    fs::create_dir_all(&cigraph_dir).await?;

    let config_file = cigraph_dir.join(CONFIG_FILE_NAME);
    CigraphConfig::default().save(&config_file).await?;

    let items_file = cigraph_dir.join(ITEMS_FILE_NAME);
    fs::write(&items_file, "").await?;

    let relationships_file = cigraph_dir.join(RELATIONSHIPS_FILE_NAME);
    fs::write(&relationships_file, "").await?;

    // Change history is local; the graph files are meant to be shared
    let gitignore_file = cigraph_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# cigraph change history and temporary files
changes.jsonl
*.tmp
";
    fs::write(&gitignore_file, gitignore_content).await?;

    tracing::debug!(path = %cigraph_dir.display(), "Initialized cigraph workspace");

    Ok(InitResult {
        cigraph_dir,
        config_file,
        items_file,
        relationships_file,
        gitignore_file,
    })
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.cigraph/`, or `None` if none is found
/// before the filesystem root or [`MAX_TRAVERSAL_DEPTH`].
pub fn find_cigraph_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(CIGRAPH_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
