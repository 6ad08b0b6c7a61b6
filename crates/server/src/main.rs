//! cloister-worker entry point.
//!
//! Boots the offline cache worker as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use cloister_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        version = %config.cache_version,
        origin = %config.origin,
        db_path = %config.db_path.display(),
        "Starting cloister-worker on stdio transport"
    );

    let state = Arc::new(state::WorkerState::open(config).await?);

    let mut notifications = state.observers.subscribe();
    tokio::spawn(async move {
        while let Ok(message) = notifications.recv().await {
            if let Ok(json) = serde_json::to_string(&message) {
                tracing::info!(message = %json, "client notification");
            }
        }
    });

    let handler = handler::CloisterServer::new(state.clone());
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    let settled = state.worker.settle().await;
    tracing::debug!(settled, "background revalidations drained");

    Ok(())
}
