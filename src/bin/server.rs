//! Standalone reference backend.
//!
//! Runs the in-memory task backend on a local port so the client stack can
//! be exercised end to end without an external service.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use taskrelay::TaskServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = match std::env::var("TASKRELAY_PORT") {
        Ok(raw) => raw.parse().context("TASKRELAY_PORT must be a port number")?,
        Err(_) => 8000,
    };

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let server = TaskServer::start(addr)
        .await
        .with_context(|| format!("start backend on {addr}"))?;
    tracing::info!(url = %server.base_url(), "backend ready");

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    tracing::info!("shutting down");
    server.shutdown();
    Ok(())
}
