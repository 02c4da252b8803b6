#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! BitQiu MCP server entry point: loads settings, builds the client
//! (restoring any persisted session), and serves tools over stdio.

use anyhow::Context;
use rmcp::{transport::stdio, ServiceExt};

use bitqiu::{BitqiuMcpServer, BitqiuSettings, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loads .toml config and environment overrides; also initializes the
    // logger. Logging goes to stderr - stdout carries the MCP protocol.
    let settings = BitqiuSettings::load()
        .map_err(|e| anyhow::anyhow!("failed to load settings: {e}"))?;

    let client = Client::new(settings).context("failed to build BitQiu client")?;
    if client.is_authenticated() {
        log::info!("restored persisted session");
    } else {
        log::info!("no session available; login tools are required before storage operations");
    }

    let server = BitqiuMcpServer::new(client);
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server on stdio")?;

    log::info!("bitqiu MCP server v{} running on stdio", bitqiu::VERSION);
    service.waiting().await.context("MCP server terminated")?;

    Ok(())
}
