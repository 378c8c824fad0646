//! Tools that need the lineage analytics module.

use std::sync::Arc;

use lineage_core::engine::{QueryEngine, QueryParams};
use lineage_store::queries::EXTENSION_FUNCTIONS;

use super::handler::QueryTool;
use super::params::NoParams;
use super::{ToolCategory, ToolDescriptor, ToolMeta};

#[must_use]
pub fn lineage_functions_tool<E: QueryEngine>(engine: &Arc<E>) -> ToolDescriptor {
    QueryTool::read(
        EXTENSION_FUNCTIONS,
        "The lineage analytics module reported no functions.",
        |_: NoParams| Ok(QueryParams::new()),
    )
    .into_descriptor(
        ToolCategory::OptionalCapability,
        ToolMeta::new(
            "list-lineage-functions",
            "List Lineage Functions",
            "Reports the installed lineage analytics module version and the \
             fn::lineage_* functions it provides.",
        ),
        engine,
    )
}
