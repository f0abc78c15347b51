//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for cigraph using clap's derive API.
//! Each command has its own argument struct with validation and helpful error messages.
//!
//! # Commands
//!
//! - `init`: Initialize a new cigraph workspace
//! - `items`: List configuration items
//! - `impact`: Show what is affected if an item fails
//! - `deps`: Show what an item depends on
//! - `relate`: Create a relationship between two items
//! - `unrelate`: Remove a relationship
//! - `show`: Show an item's relationships
//! - `types`: List relationship types
//! - `import`: Import configuration items from a JSONL file
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--actor`: Name recorded on relationships and change entries
//!
//! # Example
//!
//! ```bash
//! cigraph import assets.jsonl
//! cigraph relate CI-1 CI-2 --type depends_on
//! cigraph impact CI-2 --depth 5
//! cigraph --json deps CI-1
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

// Re-export argument structs
pub use args::{
    AnalysisArgs, ImportArgs, InitArgs, ItemsArgs, RelateArgs, ShowArgs, TypesArgs, UnrelateArgs,
};

// Re-export validators for external use
pub use validators::{validate_actor, validate_cmdb_id, validate_description};

/// cigraph - Configuration item relationship graph
///
/// Record typed relationships between configuration items and ask what breaks
/// if an item fails, or what an item depends on. Data is stored in
/// `.cigraph/` as JSONL for easy version control integration.
#[derive(Parser, Debug)]
#[command(name = "cigraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Name recorded as the creator of relationships and in the change log
    #[arg(long, global = true, env = "CIGRAPH_ACTOR", value_parser = validate_actor)]
    pub actor: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new cigraph workspace
    ///
    /// Creates the `.cigraph/` directory with configuration and empty data files.
    Init(InitArgs),

    /// List configuration items
    Items(ItemsArgs),

    /// Show what is affected if an item fails
    ///
    /// Walks relationships backwards from the item: everything that depends
    /// on or uses it, directly or transitively, up to the given depth.
    Impact(AnalysisArgs),

    /// Show what an item depends on
    ///
    /// Walks relationships forwards from the item, up to the given depth.
    Deps(AnalysisArgs),

    /// Create a relationship between two items
    Relate(RelateArgs),

    /// Remove a relationship
    ///
    /// The relationship is deactivated, not erased, and is excluded from
    /// every query afterwards.
    Unrelate(UnrelateArgs),

    /// Show an item and its relationships
    Show(ShowArgs),

    /// List relationship types with their labels
    Types(TypesArgs),

    /// Import configuration items from a JSONL file
    ///
    /// Items are inserted or replaced by internal ID.
    Import(ImportArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns a clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns the command's error. In JSON mode the error is also written
    /// to stdout as `{"error": {"code", "message"}}`.
    pub async fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let result = self.dispatch(output_mode).await;
        if let (Err(err), OutputMode::Json) = (&result, output_mode) {
            crate::output::print_json(&error_json(err))?;
        }
        result
    }

    async fn dispatch(&self, output_mode: crate::output::OutputMode) -> Result<()> {
        use crate::app::App;

        let actor = self.actor.as_deref();

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, output_mode).await,
            Some(Commands::Items(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_items(&app, args, output_mode).await
            }
            Some(Commands::Impact(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_impact(&app, args, output_mode).await
            }
            Some(Commands::Deps(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_deps(&app, args, output_mode).await
            }
            Some(Commands::Relate(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_relate(&mut app, args, actor, output_mode).await
            }
            Some(Commands::Unrelate(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_unrelate(&mut app, args, actor, output_mode).await
            }
            Some(Commands::Show(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_show(&app, args, output_mode).await
            }
            Some(Commands::Types(_)) => execute::execute_types(output_mode),
            Some(Commands::Import(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_import(&mut app, args, output_mode).await
            }
            None => {
                println!("cigraph configuration item relationship graph");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

/// JSON body for a failed command.
fn error_json(err: &anyhow::Error) -> serde_json::Value {
    let code = err
        .downcast_ref::<crate::error::Error>()
        .map_or("error", crate::error::Error::code);
    serde_json::json!({
        "error": {
            "code": code,
            "message": err.to_string(),
        }
    })
}
