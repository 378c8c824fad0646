//! MCP server implementation for mstr-lineage-mcp.
//!
//! This crate holds the lineage tool catalog, the filter pipeline that decides
//! which tools are exposed, the HTTP request gate, and the stdio and
//! streamable HTTP runners.

mod helpers;
pub mod middleware;
pub mod server;
pub mod tools;

use std::sync::Arc;

use lineage_core::auth::AuthContext;
use rmcp::model::{
    CallToolRequestParams,
    CallToolResult,
    ErrorCode,
    Implementation,
    JsonObject,
    ListToolsResult,
    PaginatedRequestParams,
    ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use tracing::debug;

use crate::tools::{RegisteredToolSet, ToolCall};

pub const SERVER_NAME: &str = "mstr-lineage-mcp";

const SERVER_INSTRUCTIONS: &str = r"mstr-lineage-mcp answers questions about MicroStrategy Metrics and Attributes and their lineage.

Workflow:
1. Find objects with `search-metrics` (name or GUID text) or `search-attributes` (terms,
   report priority, business area, parity status, data domain).
2. Inspect one object by GUID with `get-metric-by-guid` or `get-attribute-by-guid`.
3. Assess impact and sources:
   - `get-reports-using-metric` / `get-reports-using-attribute` for prioritised reports.
   - `get-metric-dependents` / `get-attribute-dependents` for every dependent report.
   - `get-metric-source-tables` / `get-attribute-source-tables` for source tables.
   - `get-metric-dependencies` / `get-attribute-dependencies` for direct dependencies.
   - `trace-metric` / `trace-attribute` with `direction` `downstream` or `upstream`.
4. Summaries: `get-metrics-stats`, `get-attributes-stats`, `get-object-stats`.

Notes:
- GUIDs must match exactly.
- Paginated tools return 100 rows per page; pass `offset` and check `moreResults`.
- Filters accept `All Prioritized`, `All Areas`, `All Status` and `All Domains` to disable them.";

/// MCP server exposing the registered lineage tools.
#[derive(Debug, Clone)]
pub struct LineageMcp {
    tools: Arc<RegisteredToolSet>,
}

impl LineageMcp {
    #[must_use]
    pub const fn new(tools: Arc<RegisteredToolSet>) -> Self {
        Self { tools }
    }

    #[must_use]
    pub fn tools(&self) -> &RegisteredToolSet {
        &self.tools
    }

    /// Runs a registered tool.
    ///
    /// # Errors
    /// Returns an `invalid_params` error when `name` is not registered. Tool
    /// failures are reported inside the returned result.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        auth: AuthContext,
    ) -> Result<CallToolResult, ErrorData> {
        let Some(tool) = self.tools.get(name) else {
            debug!(tool = name, "call to unregistered tool");
            return Err(helpers::mcp_err(
                ErrorCode::INVALID_PARAMS,
                format!("tool not found: {name}"),
            ));
        };
        Ok(tool
            .call(ToolCall {
                tool: name.to_string(),
                arguments: arguments.unwrap_or_default(),
                auth,
            })
            .await)
    }
}

/// Credentials attached by the HTTP gate. Stdio requests carry none.
fn request_auth(context: &RequestContext<RoleServer>) -> AuthContext {
    context
        .extensions
        .get::<axum::http::request::Parts>()
        .and_then(|parts| parts.extensions.get::<AuthContext>())
        .cloned()
        .unwrap_or_default()
}

impl ServerHandler for LineageMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: self.tools.specs(),
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let auth = request_auth(&context);
        self.dispatch(&request.name, request.arguments, auth).await
    }
}

#[cfg(test)]
mod tests {
    use lineage_core::capabilities::ServerCapabilities as Probed;
    use lineage_core::config::RuntimeConfig;
    use lineage_core::engine::mock::ScriptedEngine;
    use lineage_store::queries::OBJECT_DETAILS;
    use serde_json::json;

    use super::*;
    use crate::helpers::result_text;
    use crate::tools::{CatalogSettings, build_catalog};

    fn server(engine: &Arc<ScriptedEngine>, installed: bool) -> LineageMcp {
        let catalog = build_catalog(engine, CatalogSettings::default());
        let tools = RegisteredToolSet::register(
            catalog,
            &RuntimeConfig::default(),
            &Probed::with_optional_feature(installed),
        );
        LineageMcp::new(Arc::new(tools))
    }

    #[test]
    fn info_advertises_tools_and_identity() {
        let info = server(&Arc::new(ScriptedEngine::new()), false).get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "mstr-lineage-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.instructions.is_some());
    }

    #[tokio::test]
    async fn dispatch_runs_registered_tools_with_the_caller_identity() {
        let engine = Arc::new(ScriptedEngine::new().with_rows(
            OBJECT_DETAILS,
            vec![json!({"GUID": "M1", "Name": "Revenue"})],
        ));
        let mcp = server(&engine, false);
        let arguments = json!({"guid": "M1"}).as_object().cloned();
        let result = mcp
            .dispatch(
                "get-metric-by-guid",
                arguments,
                AuthContext::BearerToken {
                    token: "sso".to_string(),
                },
            )
            .await
            .expect("tool is registered");
        assert!(result_text(&result).contains("Revenue"));
        assert_eq!(engine.calls()[0].auth.mode(), "bearer");
    }

    #[tokio::test]
    async fn unregistered_tools_are_protocol_errors() {
        let engine = Arc::new(ScriptedEngine::new());
        let mcp = server(&engine, false);
        for name in ["write-query", "list-lineage-functions", "no-such-tool"] {
            let err = mcp
                .dispatch(name, None, AuthContext::None)
                .await
                .expect_err("tool should not be registered");
            assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
            assert_eq!(err.message, format!("tool not found: {name}"));
        }
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn optional_tools_dispatch_when_installed() {
        let engine = Arc::new(ScriptedEngine::new());
        let mcp = server(&engine, true);
        assert!(mcp.tools().get("list-lineage-functions").is_some());
        let result = mcp
            .dispatch("list-lineage-functions", None, AuthContext::None)
            .await
            .expect("tool is registered");
        assert_eq!(result.is_error, Some(false));
    }
}
