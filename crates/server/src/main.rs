//! swcache server entry point.
//!
//! Loads configuration, opens the bucket database, runs install and
//! activate for the configured version, then serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchConfig, HttpNetwork};
use swcache_core::{AppConfig, CacheStorage, ControllerSettings, Network, OfflineController, SqliteStorage};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let settings = ControllerSettings::from_config(&config)?;

    let storage: Arc<dyn CacheStorage> = Arc::new(
        SqliteStorage::open(&config.db_path)
            .await
            .with_context(|| format!("opening {}", config.db_path.display()))?,
    );
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let controller = OfflineController::new(settings, Arc::clone(&storage), Arc::clone(&network));

    let install = controller.install().await;
    if !install.complete() {
        tracing::warn!(failed = install.failed.len(), "static assets not fully cached; offline coverage is partial");
    }
    controller.activate().await;

    let state = Arc::new(tools::AppState::new(controller, storage, network));

    tracing::info!(origin = %config.origin, bucket = %state.controller.bucket(), "Starting swcache server on stdio transport");

    let handler = handler::SwCacheServer::new(Arc::clone(&state));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    state.controller.settle().await;

    Ok(())
}
