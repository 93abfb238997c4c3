//! waypost server entry point.
//!
//! Boots the interception layer (install, then activate) and serves it as an
//! MCP server on stdio transport. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use waypost_client::{ClientRegistry, FetchConfig, HttpFetcher, Interceptor, Lifecycle};
use waypost_core::{AppConfig, RegionBackend, RegionDb};

mod bootstrap;
mod error;
mod handler;
mod tools;

#[cfg(test)]
mod test_support;

/// Client id under which the stdio peer registers with the lifecycle.
const STDIO_CLIENT: &str = "stdio";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = Arc::new(AppConfig::load()?);
    tracing::info!(db = %config.db_path.display(), origin = %config.app_origin, "starting waypost on stdio transport");

    let backend: Arc<dyn RegionBackend> = Arc::new(RegionDb::open(&config.db_path).await?);
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from(config.as_ref()))?);
    let interceptor = Arc::new(Interceptor::new(&config, backend.clone(), fetcher.clone())?);

    let clients = ClientRegistry::new();
    clients.register(STDIO_CLIENT).await;
    let lifecycle = Lifecycle::new(config.clone(), backend, fetcher, clients)?;
    bootstrap::start(&lifecycle, config.install_attempts, bootstrap::INSTALL_BACKOFF).await?;

    let handler = handler::WaypostServer::new(interceptor.clone(), config);
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    lifecycle.clients().unregister(STDIO_CLIENT).await;
    tracing::info!(pending = interceptor.pending_writes(), "shutting down, settling write-backs");
    interceptor.settle().await;

    Ok(())
}
