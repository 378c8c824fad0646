//! Raw graph access tools. They stay in the catalog but are never registered.

use std::collections::BTreeSet;
use std::sync::Arc;

use lineage_core::engine::{QueryEngine, QueryParams, Record};
use lineage_store::queries::{PROBE_SCHEMA_HELPER, SAMPLE_TABLE, SCHEMA_SUMMARY};
use rmcp::model::CallToolResult;
use serde_json::{Value, json};
use tracing::debug;

use super::handler::{decode_arguments, render};
use super::params::{NoParams, RawQueryParams, query_params, required};
use super::{
    CatalogSettings,
    ToolCall,
    ToolCategory,
    ToolDescriptor,
    ToolFuture,
    ToolHandler,
    ToolMeta,
};
use crate::helpers::error_result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

#[must_use]
pub fn hidden_tools<E: QueryEngine>(
    engine: &Arc<E>,
    settings: CatalogSettings,
) -> Vec<ToolDescriptor> {
    vec![
        schema_tool(engine, settings),
        raw_query_tool(engine, Access::Read),
        raw_query_tool(engine, Access::Write),
    ]
}

fn schema_tool<E: QueryEngine>(engine: &Arc<E>, settings: CatalogSettings) -> ToolDescriptor {
    let engine = Arc::clone(engine);
    let handler: ToolHandler = Arc::new(move |call: ToolCall| -> ToolFuture {
        let engine = Arc::clone(&engine);
        Box::pin(async move { describe_schema(engine.as_ref(), settings, call).await })
    });
    ToolDescriptor::new::<NoParams>(
        ToolCategory::Hidden,
        true,
        ToolMeta::new(
            "get-schema",
            "Get Lineage Graph Schema",
            "Describes the tables of the lineage graph and the fields found on their records.",
        ),
        handler,
    )
}

fn raw_query_tool<E: QueryEngine>(engine: &Arc<E>, access: Access) -> ToolDescriptor {
    let meta = match access {
        Access::Read => ToolMeta::new(
            "read-query",
            "Run Read Query",
            "Runs a read-only SurrealQL statement with named parameters.",
        ),
        Access::Write => ToolMeta::new(
            "write-query",
            "Run Write Query",
            "Runs a SurrealQL statement that may modify the lineage graph.",
        ),
    };
    let engine = Arc::clone(engine);
    let handler: ToolHandler = Arc::new(move |call: ToolCall| -> ToolFuture {
        let engine = Arc::clone(&engine);
        Box::pin(async move { run_raw_query(engine.as_ref(), access, call).await })
    });
    ToolDescriptor::new::<RawQueryParams>(
        ToolCategory::Hidden,
        access == Access::Read,
        meta,
        handler,
    )
}

async fn run_raw_query<E: QueryEngine>(engine: &E, access: Access, call: ToolCall) -> CallToolResult {
    let ToolCall {
        tool,
        arguments,
        auth,
    } = call;
    let input: RawQueryParams = match decode_arguments(&tool, arguments) {
        Ok(input) => input,
        Err(result) => return result,
    };
    let query = match required(&input.query, "query") {
        Ok(query) => query,
        Err(message) => return error_result(message),
    };
    let result = match access {
        Access::Read => engine.execute_read_query(&auth, &query, input.params).await,
        Access::Write => engine.execute_write_query(&auth, &query, input.params).await,
    };
    render(engine, &tool, result, "[]")
}

/// Uses `fn::schema_summary` when the startup probe found it and it yields
/// rows, otherwise samples every table listed by `INFO FOR DB`.
async fn describe_schema<E: QueryEngine>(
    engine: &E,
    settings: CatalogSettings,
    call: ToolCall,
) -> CallToolResult {
    let ToolCall { tool, auth, .. } = call;
    if settings.schema_helper_available {
        match engine
            .execute_read_query(&auth, SCHEMA_SUMMARY, QueryParams::new())
            .await
        {
            Ok(records) if !records.is_empty() => {
                return render(engine, &tool, Ok(records), "[]");
            }
            Ok(_) => debug!(tool = %tool, "schema helper returned nothing; sampling tables"),
            Err(err) => debug!(tool = %tool, error = %err, "schema helper failed; sampling tables"),
        }
    }

    let info = match engine
        .execute_read_query(&auth, PROBE_SCHEMA_HELPER, QueryParams::new())
        .await
    {
        Ok(info) => info,
        Err(err) => return render(engine, &tool, Err(err), "[]"),
    };

    let tables = table_names(&info);
    let mut summary = Vec::with_capacity(tables.len());
    for table in tables {
        let params = query_params([
            ("table", json!(table.as_str())),
            ("limit", json!(settings.schema_sample_size)),
        ]);
        match engine.execute_read_query(&auth, SAMPLE_TABLE, params).await {
            Ok(rows) => summary.push(describe_table(&table, &rows)),
            Err(err) => return render(engine, &tool, Err(err), "[]"),
        }
    }
    render(engine, &tool, Ok(summary), "[]")
}

fn table_names(info: &[Record]) -> Vec<String> {
    info.first()
        .and_then(|info| info.get("tables"))
        .and_then(Value::as_object)
        .map(|tables| tables.keys().cloned().collect())
        .unwrap_or_default()
}

fn describe_table(table: &str, rows: &[Record]) -> Record {
    let fields: BTreeSet<&str> = rows
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    json!({
        "table": table,
        "sampledRecords": rows.len(),
        "fields": fields,
    })
}
