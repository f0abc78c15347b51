//! Application context for CLI command execution.
//!
//! This module provides the `App` struct that wires configuration, storage,
//! and the change log into a [`RelationshipService`].
//!
//! # Example
//!
//! ```no_run
//! use cigraph::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let items = app.service().list_items().await?;
//!     println!("{} items", items.len());
//!     Ok(())
//! }
//! ```

use crate::commands::init::{CIGRAPH_DIR_NAME, CONFIG_FILE_NAME, CigraphConfig, find_cigraph_root};
use crate::error::{ConfigError, Result};
use crate::service::RelationshipService;
use crate::storage::create_storage;
use std::path::Path;

/// Actor recorded when neither the command line nor the config names one.
pub const DEFAULT_ACTOR: &str = "cli";

/// Application context for CLI operations.
///
/// Storage is loaded from the workspace on creation. Mutations made through
/// the service are saved back to it as they happen.
pub struct App {
    service: RelationshipService,

    /// Actor from configuration, if any
    config_actor: Option<String>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config_actor", &self.config_actor)
            .field("service", &self.service)
            .finish()
    }
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree to find a `.cigraph/` directory,
    /// loads configuration, and initializes storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No workspace is found in the directory tree
    /// - Configuration cannot be loaded or is invalid
    /// - Storage initialization fails
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_cigraph_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let cigraph_dir = root_dir.join(CIGRAPH_DIR_NAME);
        let config = CigraphConfig::load(&cigraph_dir.join(CONFIG_FILE_NAME)).await?;

        let store = create_storage(config.storage_backend(&root_dir)).await?;
        let change_log = config.change_log(&root_dir);

        tracing::debug!(
            root = %root_dir.display(),
            backend = %config.storage.backend,
            changelog = %config.changelog.backend,
            "Opened cigraph workspace"
        );

        Ok(Self {
            service: RelationshipService::new(store, change_log),
            config_actor: config.actor,
        })
    }

    /// The relationship service.
    pub fn service(&self) -> &RelationshipService {
        &self.service
    }

    /// The relationship service, for mutating commands.
    pub fn service_mut(&mut self) -> &mut RelationshipService {
        &mut self.service
    }

    /// Resolve the acting user: explicit value, then config, then [`DEFAULT_ACTOR`].
    pub fn actor<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .filter(|a| !a.trim().is_empty())
            .or(self.config_actor.as_deref())
            .unwrap_or(DEFAULT_ACTOR)
    }
}
