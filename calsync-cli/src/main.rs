mod commands;
mod render;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use calsync_core::authoring::EventAuthoringFlow;
use calsync_core::config::CalSyncConfig;
use calsync_core::store::JsonFileEventStore;
use calsync_core::sync::SyncCoordinator;
use calsync_core::window::SyncWindow;
use calsync_http::HttpEventSource;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Browse, search and create events on your calendar server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync and show events
    Events {
        /// Show events from this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Show events until this date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Create an event on the server
    New(commands::new::NewArgs),
    /// Search events on the server
    Search {
        keyword: Option<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,
    },
    /// Delete every cached event
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calsync=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CalSyncConfig::load()?;
    debug!(
        server = %config.server_url,
        sync_days = config.sync_days,
        "loaded config"
    );

    match cli.command {
        Commands::Events { from, to } => {
            let window = SyncWindow::from_args(from.as_deref(), to.as_deref(), config.sync_days)?;
            commands::events::run(&coordinator(&config)?, window).await
        }
        Commands::New(args) => commands::new::run(args, &authoring_flow(&config)?).await,
        Commands::Search { keyword, from, to } => {
            let window = SyncWindow::from_args(from.as_deref(), to.as_deref(), config.sync_days)?;
            commands::search::run(&coordinator(&config)?, keyword.as_deref(), window).await
        }
        Commands::Clear => commands::clear::run(&coordinator(&config)?).await,
    }
}

fn remote(config: &CalSyncConfig) -> Result<Arc<HttpEventSource>> {
    let source = HttpEventSource::new(
        config.server_url.clone(),
        config.access_token.clone(),
        config.fetch_timeout(),
    )
    .context("Failed to set up HTTP client")?;

    Ok(Arc::new(source))
}

fn coordinator(config: &CalSyncConfig) -> Result<SyncCoordinator> {
    let store = JsonFileEventStore::new(config.cache_path()?);

    Ok(SyncCoordinator::new(Arc::new(store), remote(config)?)
        .with_fetch_timeout(config.fetch_timeout()))
}

fn authoring_flow(config: &CalSyncConfig) -> Result<EventAuthoringFlow> {
    Ok(EventAuthoringFlow::new(remote(config)?))
}
