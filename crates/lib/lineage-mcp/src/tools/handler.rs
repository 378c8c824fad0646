//! Generic handler factory.
//!
//! Most tools run one fixed statement: decode the arguments, map them onto
//! query parameters, execute, and render the rows. [`QueryTool`] captures the
//! parts that differ between tools.

use std::sync::Arc;

use lineage_core::engine::{EngineResult, QueryEngine, QueryParams, Record};
use rmcp::model::CallToolResult;
use rmcp::schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use super::{ToolCall, ToolCategory, ToolDescriptor, ToolFuture, ToolHandler, ToolMeta};
use crate::helpers::{error_result, text_result};

type BindFn<I> = dyn Fn(I) -> Result<QueryParams, String> + Send + Sync;

/// A read-only tool defined by its input shape, statement text and
/// parameter mapping.
pub struct QueryTool<I> {
    query: &'static str,
    on_empty: &'static str,
    bind: Box<BindFn<I>>,
}

impl<I> QueryTool<I>
where
    I: DeserializeOwned + JsonSchema + Send + 'static,
{
    /// `on_empty` is returned verbatim when no rows match.
    #[must_use]
    pub fn read<F>(query: &'static str, on_empty: &'static str, bind: F) -> Self
    where
        F: Fn(I) -> Result<QueryParams, String> + Send + Sync + 'static,
    {
        Self {
            query,
            on_empty,
            bind: Box::new(bind),
        }
    }

    #[must_use]
    pub fn into_descriptor<E: QueryEngine>(
        self,
        category: ToolCategory,
        meta: ToolMeta,
        engine: &Arc<E>,
    ) -> ToolDescriptor {
        let handler = self.into_handler(Arc::clone(engine));
        ToolDescriptor::new::<I>(category, true, meta, handler)
    }

    fn into_handler<E: QueryEngine>(self, engine: Arc<E>) -> ToolHandler {
        let tool = Arc::new(self);
        Arc::new(move |call: ToolCall| -> ToolFuture {
            let tool = Arc::clone(&tool);
            let engine = Arc::clone(&engine);
            Box::pin(async move { tool.execute(engine.as_ref(), call).await })
        })
    }

    async fn execute<E: QueryEngine>(&self, engine: &E, call: ToolCall) -> CallToolResult {
        let ToolCall {
            tool,
            arguments,
            auth,
        } = call;
        let input: I = match decode_arguments(&tool, arguments) {
            Ok(input) => input,
            Err(result) => return result,
        };
        let params = match (self.bind)(input) {
            Ok(params) => params,
            Err(message) => {
                debug!(tool = %tool, %message, "rejected tool arguments");
                return error_result(message);
            }
        };
        debug!(tool = %tool, auth = auth.mode(), "executing tool statement");
        let result = engine.execute_read_query(&auth, self.query, params).await;
        render(engine, &tool, result, self.on_empty)
    }
}

/// Decodes tool arguments into `I`, or the error result to return.
pub(crate) fn decode_arguments<I: DeserializeOwned>(
    tool: &str,
    arguments: rmcp::model::JsonObject,
) -> Result<I, CallToolResult> {
    serde_json::from_value(Value::Object(arguments)).map_err(|err| {
        debug!(tool, error = %err, "failed to decode tool arguments");
        error_result(format!("invalid arguments: {err}"))
    })
}

/// Converts a statement outcome into the result returned to the client.
pub(crate) fn render<E: QueryEngine>(
    engine: &E,
    tool: &str,
    result: EngineResult<Vec<Record>>,
    on_empty: &str,
) -> CallToolResult {
    let records = match result {
        Ok(records) => records,
        Err(err) => {
            error!(tool, error = %err, "tool statement failed");
            return error_result(err.to_string());
        }
    };
    if records.is_empty() {
        return text_result(on_empty);
    }
    match engine.records_to_json(&records) {
        Ok(text) => text_result(text),
        Err(err) => {
            error!(tool, error = %err, "failed to format tool results");
            error_result(err.to_string())
        }
    }
}
