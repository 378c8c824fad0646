//! Daemon entry point for the MicroStrategy lineage MCP server.
//!
//! Loads configuration from flags and the environment, probes the lineage
//! database, registers the exposed tools, and serves MCP over stdio or
//! streamable HTTP.

mod config;
mod logging;

use std::sync::Arc;

use lineage_core::capabilities::probe_capabilities;
use lineage_core::engine::SurrealEngine;
use lineage_mcp::server::{serve_stdio, serve_streamable_http};
use lineage_mcp::tools::{CatalogSettings, RegisteredToolSet, build_catalog};
use tracing::{error, info, warn};

use crate::config::{ConfigError, LineageConfig, Transport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = match LineageConfig::from_args() {
        Ok(config) => config,
        Err(ConfigError::Cli(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };
    logging::init(config.log_level, config.log_format)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?config.transport,
        read_only = config.read_only,
        "starting mstr-lineage-mcp"
    );

    let engine = Arc::new(SurrealEngine::connect(config.surreal_settings()).await?);
    let capabilities = probe_capabilities(engine.as_ref())
        .await
        .inspect_err(|err| error!(error = %err, "capability probe failed"))?;

    let runtime = config.runtime_config();
    let catalog = build_catalog(
        &engine,
        CatalogSettings {
            schema_sample_size: config.schema_sample_size,
            schema_helper_available: capabilities.schema_helper_available,
        },
    );
    let catalog_size = catalog.len();
    let tools = Arc::new(RegisteredToolSet::register(catalog, &runtime, &capabilities));
    info!(
        registered = tools.len(),
        catalog = catalog_size,
        read_only = runtime.read_only,
        optional_feature = capabilities.optional_feature_installed(),
        "tools registered"
    );
    if tools.is_empty() {
        warn!("no tools are registered; clients will see an empty tool list");
    }

    match config.transport {
        Transport::Stdio => serve_stdio(tools).await,
        Transport::Http => {
            serve_streamable_http(tools, &runtime, config.http_server_config()).await
        }
    }
}
