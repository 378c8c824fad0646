//! MCP server runners for mstr-lineage-mcp.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use lineage_core::config::RuntimeConfig;
use rmcp::serve_server;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig,
    StreamableHttpService,
    session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::LineageMcp;
use crate::middleware::{MCP_PATH, guard};
use crate::tools::RegisteredToolSet;

/// Configuration for the MCP streamable HTTP server.
#[derive(Debug, Clone)]
pub struct McpHttpServerConfig {
    pub addr: SocketAddr,
    pub stateful_mode: bool,
    pub sse_keep_alive: Option<Duration>,
    pub sse_retry: Option<Duration>,
}

impl McpHttpServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            stateful_mode: true,
            sse_keep_alive: Some(Duration::from_secs(15)),
            sse_retry: Some(Duration::from_secs(3)),
        }
    }

    #[must_use]
    pub const fn with_stateful_mode(mut self, stateful_mode: bool) -> Self {
        self.stateful_mode = stateful_mode;
        self
    }

    #[must_use]
    pub const fn with_sse_keep_alive(mut self, sse_keep_alive: Option<Duration>) -> Self {
        self.sse_keep_alive = sse_keep_alive;
        self
    }

    #[must_use]
    pub const fn with_sse_retry(mut self, sse_retry: Option<Duration>) -> Self {
        self.sse_retry = sse_retry;
        self
    }
}

impl Default for McpHttpServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 80)))
    }
}

/// Serves the MCP server over stdio.
///
/// # Errors
/// Returns any transport or server error.
pub async fn serve_stdio(
    tools: Arc<RegisteredToolSet>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = LineageMcp::new(tools);
    let (stdin, stdout) = stdio();
    info!("serving MCP over stdio");
    let running = serve_server(service, (stdin, stdout)).await?;
    let _ = running.waiting().await?;
    Ok(())
}

/// Builds the HTTP application: the request gate wrapped around the
/// streamable HTTP MCP service.
///
/// The service is mounted as the fallback so that every path passes the
/// gate; the path check then rejects anything other than `/mcp`. Cancelling
/// `shutdown` ends every open session and SSE stream.
#[must_use]
pub fn build_http_router(
    tools: Arc<RegisteredToolSet>,
    runtime: &RuntimeConfig,
    config: &McpHttpServerConfig,
    shutdown: &CancellationToken,
) -> Router {
    let service: StreamableHttpService<LineageMcp, LocalSessionManager> =
        StreamableHttpService::new(
            move || Ok(LineageMcp::new(Arc::clone(&tools))),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                sse_keep_alive: config.sse_keep_alive,
                sse_retry: config.sse_retry,
                stateful_mode: config.stateful_mode,
                cancellation_token: shutdown.child_token(),
            },
        );
    guard(Router::new().fallback_service(service), runtime)
}

/// Serves the MCP server using streamable HTTP transport until ctrl-c.
///
/// # Errors
/// Returns any listener or server error.
pub async fn serve_streamable_http(
    tools: Arc<RegisteredToolSet>,
    runtime: &RuntimeConfig,
    config: McpHttpServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));
    serve_streamable_http_until(tools, runtime, config, shutdown).await
}

/// Serves the MCP server using streamable HTTP transport until `shutdown`
/// is cancelled. Open SSE streams are closed so the listener can drain.
///
/// # Errors
/// Returns any listener or server error.
pub async fn serve_streamable_http_until(
    tools: Arc<RegisteredToolSet>,
    runtime: &RuntimeConfig,
    config: McpHttpServerConfig,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = build_http_router(tools, runtime, &config, &shutdown);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(
        addr = %listener.local_addr()?,
        path = MCP_PATH,
        stateful = config.stateful_mode,
        api_token = runtime.api_token.is_some(),
        "serving MCP over streamable HTTP"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;
    info!("streamable HTTP server stopped");
    Ok(())
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    shutdown_signal().await;
    info!("shutdown requested");
    shutdown.cancel();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
