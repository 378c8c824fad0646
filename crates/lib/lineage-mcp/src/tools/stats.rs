//! Parity and usage statistics.

use std::sync::Arc;

use lineage_core::engine::QueryEngine;
use lineage_store::ObjectKind;
use lineage_store::queries::{OBJECT_STATS, OBJECT_TYPE_STATS};
use serde_json::json;

use super::handler::QueryTool;
use super::params::{GuidParams, StatsParams, query_params, required, statuses};
use super::{ToolCategory, ToolDescriptor, ToolMeta};

const EMPTY_STATS: &str = r#"{"total": 0, "complete": 0, "planned": 0, "notPlanned": 0, "noStatus": 0, "prioritized": 0, "teams": []}"#;

#[must_use]
pub fn core_tools<E: QueryEngine>(engine: &Arc<E>) -> Vec<ToolDescriptor> {
    vec![
        type_stats_tool(engine, ObjectKind::Metric),
        type_stats_tool(engine, ObjectKind::Attribute),
        object_stats_tool(engine),
    ]
}

fn type_stats_tool<E: QueryEngine>(engine: &Arc<E>, kind: ObjectKind) -> ToolDescriptor {
    let slug = kind.slug();
    QueryTool::read(OBJECT_TYPE_STATS, EMPTY_STATS, move |input: StatsParams| {
        Ok(query_params([
            ("object_type", json!(kind.type_name())),
            ("statuses", json!(statuses(input.status))),
            ("team", json!(input.team.trim())),
        ]))
    })
    .into_descriptor(
        ToolCategory::Core,
        ToolMeta::new(
            format!("get-{slug}s-stats"),
            format!("Get {kind} Statistics"),
            format!(
                "Summarises parity progress across all {kind}s: totals by status, the \
                 number with an inherited priority, and the teams involved. Optionally \
                 restrict to some statuses or one team."
            ),
        ),
        engine,
    )
}

fn object_stats_tool<E: QueryEngine>(engine: &Arc<E>) -> ToolDescriptor {
    QueryTool::read(
        OBJECT_STATS,
        "No object found with the specified GUID.",
        |input: GuidParams| {
            let guid = required(&input.guid, "guid")?;
            Ok(query_params([("guid", json!(guid))]))
        },
    )
    .into_descriptor(
        ToolCategory::Core,
        ToolMeta::new(
            "get-object-stats",
            "Get Object Statistics",
            "Counts the reports and source tables reached from any object by GUID, with \
             reports grouped by priority level.",
        ),
        engine,
    )
}
