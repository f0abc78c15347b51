//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::Result;

use super::args::{
    AnalysisArgs, ImportArgs, InitArgs, ItemsArgs, RelateArgs, ShowArgs, UnrelateArgs,
};
use crate::app::App;
use crate::domain::{CmdbId, EdgeId, RelationshipRequest};
use crate::error::StorageError;
use crate::output::{self, OutputMode, RelationshipChange};
use crate::service::RelationshipService;

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "cigraph_dir": result.cigraph_dir.display().to_string(),
                "config_file": result.config_file.display().to_string(),
                "items_file": result.items_file.display().to_string(),
                "relationships_file": result.relationships_file.display().to_string(),
            }))?;
        }
        OutputMode::Text if !args.quiet => {
            println!("Initialized cigraph in {}", result.cigraph_dir.display());
            println!("  Config:        {}", result.config_file.display());
            println!("  Items:         {}", result.items_file.display());
            println!("  Relationships: {}", result.relationships_file.display());
        }
        OutputMode::Text => {}
    }

    Ok(())
}

/// Execute the items command
pub async fn execute_items(app: &App, args: &ItemsArgs, output_mode: OutputMode) -> Result<()> {
    let mut items = app.service().list_items().await?;

    if let Some(category) = args.category.as_deref() {
        items.retain(|item| item.asset_category.eq_ignore_ascii_case(category));
    }

    output::print_items(&items, output_mode)?;
    Ok(())
}

/// Execute the impact command
pub async fn execute_impact(app: &App, args: &AnalysisArgs, output_mode: OutputMode) -> Result<()> {
    let report = app
        .service()
        .impact_analysis(&CmdbId::new(args.cmdb_id.as_str()), args.max_depth())
        .await?;

    output::print_impact_report(&report, output_mode)?;
    Ok(())
}

/// Execute the deps command
pub async fn execute_deps(app: &App, args: &AnalysisArgs, output_mode: OutputMode) -> Result<()> {
    let report = app
        .service()
        .dependency_analysis(&CmdbId::new(args.cmdb_id.as_str()), args.max_depth())
        .await?;

    output::print_dependency_report(&report, output_mode)?;
    Ok(())
}

/// Execute the relate command
pub async fn execute_relate(
    app: &mut App,
    args: &RelateArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    let actor = app.actor(actor).to_string();
    let request = RelationshipRequest {
        source_cmdb_id: CmdbId::new(args.source.as_str()),
        target_cmdb_id: CmdbId::new(args.target.as_str()),
        relationship_type: args.relationship_type.clone(),
        description: args.description.clone(),
    };

    let edge = app
        .service_mut()
        .create_relationship(request, &actor)
        .await?;

    let service = app.service();
    let source = service.require_item(&CmdbId::new(args.source.as_str())).await?;
    let target = service.require_item(&CmdbId::new(args.target.as_str())).await?;

    output::print_relationship_change(
        &RelationshipChange {
            action: "created",
            relationship: &edge,
            source: &source,
            target: &target,
        },
        output_mode,
    )?;
    Ok(())
}

/// Execute the unrelate command
pub async fn execute_unrelate(
    app: &mut App,
    args: &UnrelateArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    let actor = app.actor(actor).to_string();

    let edge = app
        .service_mut()
        .delete_relationship(EdgeId(args.relationship_id), &actor)
        .await?;

    let service = app.service();
    let source = load_item(service, edge.source_item_id).await?;
    let target = load_item(service, edge.target_item_id).await?;

    output::print_relationship_change(
        &RelationshipChange {
            action: "removed",
            relationship: &edge,
            source: &source,
            target: &target,
        },
        output_mode,
    )?;
    Ok(())
}

async fn load_item(
    service: &RelationshipService,
    id: crate::domain::ItemId,
) -> Result<crate::domain::ConfigurationItem> {
    service
        .store()
        .get_item(id)
        .await?
        .ok_or_else(|| StorageError::Inconsistent(format!("missing item {id}")).into())
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let relationships = app
        .service()
        .item_relationships(&CmdbId::new(args.cmdb_id.as_str()))
        .await?;

    output::print_item_relationships(&relationships, output_mode)?;
    Ok(())
}

/// Execute the types command
pub fn execute_types(output_mode: OutputMode) -> Result<()> {
    output::print_relationship_types(RelationshipService::relationship_types(), output_mode)?;
    Ok(())
}

/// Execute the import command
pub async fn execute_import(app: &mut App, args: &ImportArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::import;

    let items = import::read_items(&args.file).await?;
    let count = app.service_mut().import_items(items).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "imported": count,
                "file": args.file.display().to_string(),
            }))?;
        }
        OutputMode::Text => {
            println!(
                "Imported {count} item(s) from {}",
                args.file.display()
            );
        }
    }
    Ok(())
}
