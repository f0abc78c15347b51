//! cigraph CLI binary.

use anyhow::Result;
use cigraph::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the cigraph CLI.
///
/// Every command is a short sequence of file reads and writes, so a
/// `current_thread` runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=cigraph=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cigraph=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting cigraph CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("cigraph CLI completed successfully");
    Ok(())
}
