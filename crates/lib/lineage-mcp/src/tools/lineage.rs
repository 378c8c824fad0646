//! Core lookup and lineage tools for Metrics and Attributes.
//!
//! Every tool except the two searches exists once per [`ObjectKind`]; the
//! definitions below are shared and parameterised by kind.

use std::sync::Arc;

use lineage_core::engine::{QueryEngine, QueryParams};
use lineage_store::ObjectKind;
use lineage_store::queries::{
    DOWNSTREAM_DEPENDENCIES,
    OBJECT_DETAILS,
    REPORTS_USING_OBJECT,
    SEARCH_METRICS,
    SEARCH_OBJECTS,
    SOURCE_TABLES,
    TRACE_OBJECT,
    UPSTREAM_DEPENDENCIES,
};
use serde_json::json;

use super::handler::QueryTool;
use super::params::{
    GuidParams,
    PagedGuidParams,
    ReportUsageParams,
    SearchMetricsParams,
    SearchObjectsParams,
    TraceParams,
    business_areas,
    data_domains,
    priority_levels,
    query_params,
    required,
    search_terms,
    statuses,
    with_page,
};
use super::{ToolCategory, ToolDescriptor, ToolMeta};

const KINDS: [ObjectKind; 2] = [ObjectKind::Metric, ObjectKind::Attribute];

const EMPTY_REPORTS: &str = r#"{"objectName": "", "objectGUID": "", "objectType": "", "totalReports": 0, "reports": [], "moreResults": false}"#;
const EMPTY_TABLES: &str = r#"{"objectName": "", "objectGUID": "", "objectType": "", "totalTables": 0, "tables": [], "moreResults": false}"#;
const EMPTY_DEPENDENCIES: &str = r#"{"objectName": "", "objectGUID": "", "objectType": "", "totalDirectDeps": 0, "transitiveTableCount": 0, "directDependencies": [], "moreResults": false}"#;

const fn not_found(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Metric => "No Metric found with the specified GUID.",
        ObjectKind::Attribute => "No Attribute found with the specified GUID.",
    }
}

/// Lookup, search, impact and trace tools.
#[must_use]
pub fn core_tools<E: QueryEngine>(engine: &Arc<E>) -> Vec<ToolDescriptor> {
    let mut tools = Vec::new();
    for kind in KINDS {
        tools.push(details_tool(engine, kind));
        tools.push(reports_using_tool(engine, kind));
        tools.push(source_tables_tool(engine, kind));
        tools.push(dependencies_tool(engine, kind));
        tools.push(dependents_tool(engine, kind));
        tools.push(trace_tool(engine, kind));
    }
    tools.push(search_metrics_tool(engine));
    tools.push(search_attributes_tool(engine));
    tools
}

fn details_tool<E: QueryEngine>(engine: &Arc<E>, kind: ObjectKind) -> ToolDescriptor {
    let slug = kind.slug();
    QueryTool::read(OBJECT_DETAILS, not_found(kind), move |input: GuidParams| {
        let guid = required(&input.guid, "guid")?;
        Ok(query_params([
            ("object_type", json!(kind.type_name())),
            ("guids", json!([guid])),
        ]))
    })
    .into_descriptor(
        ToolCategory::Core,
        ToolMeta::new(
            format!("get-{slug}-by-guid"),
            format!("Get {kind} by GUID"),
            format!(
                "Returns the full record of one {kind} by exact GUID: parity status, \
                 team and group, inherited priority, formula, target tables and columns, \
                 semantic model mapping, notes, and report and source table counts."
            ),
        ),
        engine,
    )
}

fn reports_using_tool<E: QueryEngine>(engine: &Arc<E>, kind: ObjectKind) -> ToolDescriptor {
    let slug = kind.slug();
    QueryTool::read(
        REPORTS_USING_OBJECT,
        EMPTY_REPORTS,
        |input: ReportUsageParams| {
            let guid = required(&input.guid, "guid")?;
            let params = query_params([
                ("guids", json!([guid])),
                ("priority_levels", json!(priority_levels(input.priority_level)?)),
                ("business_areas", json!(business_areas(input.business_area))),
            ]);
            Ok(with_page(params, input.offset))
        },
    )
    .into_descriptor(
        ToolCategory::Core,
        ToolMeta::new(
            format!("get-reports-using-{slug}"),
            format!("Get Reports Using {kind}"),
            format!(
                "Lists the prioritised Reports, GridReports and Documents that use a {kind}, \
                 directly or through Prompts and Filters. Filter by priority level and \
                 business area. Results are paginated 100 at a time via offset."
            ),
        ),
        engine,
    )
}

fn source_tables_tool<E: QueryEngine>(engine: &Arc<E>, kind: ObjectKind) -> ToolDescriptor {
    let slug = kind.slug();
    QueryTool::read(SOURCE_TABLES, EMPTY_TABLES, paged_guid)
        .into_descriptor(
            ToolCategory::Core,
            ToolMeta::new(
                format!("get-{slug}-source-tables"),
                format!("Get {kind} Source Tables"),
                format!(
                    "Lists the logical and physical tables a {kind} is ultimately sourced \
                     from, following Facts, Metrics, Attributes and Columns. Results are \
                     paginated 100 at a time via offset."
                ),
            ),
            engine,
        )
}

fn dependencies_tool<E: QueryEngine>(engine: &Arc<E>, kind: ObjectKind) -> ToolDescriptor {
    let slug = kind.slug();
    QueryTool::read(DOWNSTREAM_DEPENDENCIES, EMPTY_DEPENDENCIES, paged_guid)
        .into_descriptor(
            ToolCategory::Core,
            ToolMeta::new(
                format!("get-{slug}-dependencies"),
                format!("Get {kind} Dependencies"),
                format!(
                    "Lists the objects a {kind} depends on directly, with formulas, and \
                     counts the source tables reached transitively. Results are paginated \
                     100 at a time via offset."
                ),
            ),
            engine,
        )
}

fn dependents_tool<E: QueryEngine>(engine: &Arc<E>, kind: ObjectKind) -> ToolDescriptor {
    let slug = kind.slug();
    QueryTool::read(UPSTREAM_DEPENDENCIES, EMPTY_REPORTS, paged_guid)
        .into_descriptor(
            ToolCategory::Core,
            ToolMeta::new(
                format!("get-{slug}-dependents"),
                format!("Get {kind} Dependents"),
                format!(
                    "Lists every Report, GridReport and Document that depends on a {kind}, \
                     prioritised or not. Results are paginated 100 at a time via offset."
                ),
            ),
            engine,
        )
}

fn trace_tool<E: QueryEngine>(engine: &Arc<E>, kind: ObjectKind) -> ToolDescriptor {
    let slug = kind.slug();
    QueryTool::read(TRACE_OBJECT, not_found(kind), move |input: TraceParams| {
        let guid = required(&input.guid, "guid")?;
        let params = query_params([
            ("guid", json!(guid)),
            ("object_type", json!(kind.type_name())),
            ("direction", json!(input.direction.as_str())),
        ]);
        Ok(with_page(params, input.offset))
    })
    .into_descriptor(
        ToolCategory::Core,
        ToolMeta::new(
            format!("trace-{slug}"),
            format!("Trace {kind} Lineage"),
            format!(
                "Walks the lineage graph from one {kind}. `downstream` returns the \
                 prioritised reports that use it; `upstream` returns its source tables \
                 and direct dependencies. Results are paginated 100 at a time via offset."
            ),
        ),
        engine,
    )
}

fn search_metrics_tool<E: QueryEngine>(engine: &Arc<E>) -> ToolDescriptor {
    QueryTool::read(
        SEARCH_METRICS,
        "No Metrics found matching the specified criteria.",
        |input: SearchMetricsParams| {
            let query = required(&input.query, "query")?;
            let params = query_params([
                ("query", json!(query)),
                ("statuses", json!(statuses(input.status))),
            ]);
            Ok(with_page(params, input.offset))
        },
    )
    .into_descriptor(
        ToolCategory::Core,
        ToolMeta::new(
            "search-metrics",
            "Search Metrics",
            "Finds Metrics whose name or GUID contains the query text, optionally filtered \
             by parity status. Results are paginated 100 at a time via offset.",
        ),
        engine,
    )
}

fn search_attributes_tool<E: QueryEngine>(engine: &Arc<E>) -> ToolDescriptor {
    QueryTool::read(
        SEARCH_OBJECTS,
        "No Attributes found matching the specified criteria.",
        |input: SearchObjectsParams| {
            let params = query_params([
                ("object_type", json!(ObjectKind::Attribute.type_name())),
                ("search_terms", json!(search_terms(&input.search_term))),
                ("priority_levels", json!(priority_levels(input.priority_level)?)),
                ("business_areas", json!(business_areas(input.business_area))),
                ("statuses", json!(statuses(input.status))),
                ("data_domains", json!(data_domains(input.data_domain))),
            ]);
            Ok(with_page(params, input.offset))
        },
    )
    .into_descriptor(
        ToolCategory::Core,
        ToolMeta::new(
            "search-attributes",
            "Search Attributes",
            "Finds Attributes used by prioritised reports. Filter by comma-separated \
             search terms, report priority, business area, parity status and data \
             domain. Results are paginated 100 at a time via offset.",
        ),
        engine,
    )
}

#[allow(clippy::needless_pass_by_value)]
fn paged_guid(input: PagedGuidParams) -> Result<QueryParams, String> {
    let guid = required(&input.guid, "guid")?;
    Ok(with_page(query_params([("guids", json!([guid]))]), input.offset))
}

#[cfg(test)]
mod tests {
    use lineage_core::engine::mock::ScriptedEngine;
    use serde_json::Value;

    use super::*;
    use crate::helpers::result_text;
    use crate::tools::ToolCall;

    fn find(tools: &[ToolDescriptor], name: &str) -> ToolDescriptor {
        tools
            .iter()
            .find(|tool| tool.name() == name)
            .cloned()
            .unwrap_or_else(|| panic!("missing tool {name}"))
    }

    async fn invoke(engine: &Arc<ScriptedEngine>, name: &str, arguments: Value) -> String {
        let tool = find(&core_tools(engine), name);
        let result = tool
            .call(ToolCall {
                tool: name.to_string(),
                arguments: arguments.as_object().cloned().unwrap_or_default(),
                auth: lineage_core::auth::AuthContext::None,
            })
            .await;
        result_text(&result)
    }

    #[test]
    fn one_definition_serves_both_kinds() {
        let engine = Arc::new(ScriptedEngine::new());
        let tools = core_tools(&engine);
        assert_eq!(tools.len(), 14);
        for name in [
            "get-metric-by-guid",
            "get-attribute-by-guid",
            "get-reports-using-attribute",
            "get-metric-source-tables",
            "get-attribute-dependencies",
            "get-metric-dependents",
            "trace-attribute",
            "search-metrics",
            "search-attributes",
        ] {
            let _ = find(&tools, name);
        }
    }

    #[tokio::test]
    async fn details_are_scoped_to_the_object_kind() {
        let engine = Arc::new(ScriptedEngine::new());
        let text = invoke(&engine, "get-attribute-by-guid", json!({"guid": "A1"})).await;
        assert_eq!(text, "No Attribute found with the specified GUID.");

        let calls = engine.calls();
        assert_eq!(calls[0].query, OBJECT_DETAILS);
        assert_eq!(calls[0].params.get("object_type"), Some(&json!("Attribute")));
        assert_eq!(calls[0].params.get("guids"), Some(&json!(["A1"])));
    }

    #[tokio::test]
    async fn report_filters_are_normalised() {
        let engine = Arc::new(ScriptedEngine::new());
        let text = invoke(
            &engine,
            "get-reports-using-metric",
            json!({
                "guid": "M1",
                "priorityLevel": ["P1 (Highest)", "P2"],
                "businessArea": ["All Areas"],
                "offset": 100
            }),
        )
        .await;
        assert_eq!(text, EMPTY_REPORTS);

        let calls = engine.calls();
        let params = &calls[0].params;
        assert_eq!(params.get("priority_levels"), Some(&json!([1, 2])));
        assert_eq!(params.get("business_areas"), Some(&json!([])));
        assert_eq!(params.get("offset"), Some(&json!(100)));
        assert_eq!(params.get("page_size"), Some(&json!(100)));
    }

    #[tokio::test]
    async fn search_metrics_requires_query_text() {
        let engine = Arc::new(ScriptedEngine::new());
        let text = invoke(&engine, "search-metrics", json!({"query": " "})).await;
        assert_eq!(text, "query parameter is required");
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn search_attributes_splits_terms() {
        let engine = Arc::new(ScriptedEngine::new());
        let _ = invoke(
            &engine,
            "search-attributes",
            json!({"searchTerm": "Region, Customer", "status": ["All Status"]}),
        )
        .await;
        let calls = engine.calls();
        let params = &calls[0].params;
        assert_eq!(params.get("search_terms"), Some(&json!(["region", "customer"])));
        assert_eq!(params.get("statuses"), Some(&json!([])));
        assert_eq!(params.get("object_type"), Some(&json!("Attribute")));
    }

    #[tokio::test]
    async fn trace_binds_direction_and_kind() {
        let engine = Arc::new(ScriptedEngine::new().with_rows(
            TRACE_OBJECT,
            vec![json!({"direction": "upstream", "tables": [], "moreResults": false})],
        ));
        let text = invoke(
            &engine,
            "trace-metric",
            json!({"guid": "M1", "direction": "upstream"}),
        )
        .await;
        assert!(text.contains("\"upstream\""));

        let calls = engine.calls();
        let params = &calls[0].params;
        assert_eq!(params.get("direction"), Some(&json!("upstream")));
        assert_eq!(params.get("object_type"), Some(&json!("Metric")));
        assert_eq!(params.get("offset"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn trace_requires_a_direction() {
        let engine = Arc::new(ScriptedEngine::new());
        let text = invoke(&engine, "trace-attribute", json!({"guid": "A1"})).await;
        assert!(text.contains("direction"), "{text}");
        assert!(engine.calls().is_empty());
    }
}
