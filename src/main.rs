//! rtir-rest - MCP server for RT / RTIR
//!
//! This binary runs as an MCP server using stdio transport, exposing the
//! RT REST 1.0 interface of an RTIR installation as tools.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `RTIR_BASE_URL`: Base URL of the RT installation
//! - `RTIR_USER`: RT user name
//! - `RTIR_PASSWORD`: RT password
//!
//! # Usage
//!
//! ```bash
//! RTIR_BASE_URL=https://rtir.example.com RTIR_USER=analyst RTIR_PASSWORD=xxx ./rtir-rest
//! ```

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, EnvFilter};

use rtir_rest::{config, rt_client, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // stdout is reserved for MCP JSON-RPC messages
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rtir_rest=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting rtir-rest MCP server v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::from_env().context("Failed to load configuration")?;

    tracing::debug!(?config, "Configuration loaded");

    let mut client =
        rt_client::RtirClient::new(config).context("Failed to create RT client")?;

    tracing::info!("Logging in to RT...");
    match client.login().await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(
            "RT rejected the login. Tools will retry on first use; check RTIR_USER and RTIR_PASSWORD."
        ),
        Err(e) => {
            tracing::error!(
                error = %e.sanitized_display(client.config().password()),
                "Login failed"
            );
            tracing::warn!(
                "Server will start but may not be able to reach RT. \
                 Check configuration and network connectivity."
            );
        }
    }

    let server = server::RtirServer::new(client);

    tracing::info!("Server initialized, starting stdio transport");

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })
        .context("Failed to start server")?;

    tracing::info!("Server running, waiting for requests");

    service
        .waiting()
        .await
        .context("Server error during operation")?;

    tracing::info!("Server shutting down");

    Ok(())
}
