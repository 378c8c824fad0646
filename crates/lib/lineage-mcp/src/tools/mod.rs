//! Tool catalog for the lineage server.
//!
//! The catalog is built once from static metadata. Which of its tools are
//! exposed is decided by the filter pipeline in [`filter`].

pub mod extension;
pub mod filter;
pub mod graph;
pub mod handler;
pub mod lineage;
pub mod params;
pub mod stats;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use lineage_core::auth::AuthContext;
use lineage_core::engine::QueryEngine;
use rmcp::model::{CallToolResult, JsonObject, Tool, ToolAnnotations};
use rmcp::schemars::JsonSchema;

pub use filter::{RegisteredToolSet, ToolFilter};

/// Exposure class of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolCategory {
    /// Kept in the catalog, never registered.
    Hidden,
    /// Registered only when the lineage analytics module is installed.
    OptionalCapability,
    Core,
}

/// One invocation of a tool.
#[derive(Debug, Clone, Default)]
pub struct ToolCall {
    pub tool: String,
    pub arguments: JsonObject,
    pub auth: AuthContext,
}

pub type ToolFuture = BoxFuture<'static, CallToolResult>;
pub type ToolHandler = Arc<dyn Fn(ToolCall) -> ToolFuture + Send + Sync>;

/// Name, title and description of a tool as advertised to clients.
#[derive(Debug, Clone)]
pub struct ToolMeta {
    pub name: String,
    pub title: String,
    pub description: String,
}

impl ToolMeta {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// A catalog entry. Identity is the tool name.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub category: ToolCategory,
    pub readonly: bool,
    pub spec: Tool,
    pub handler: ToolHandler,
}

impl ToolDescriptor {
    /// Builds a descriptor whose input schema is generated from `I`.
    #[must_use]
    pub fn new<I: JsonSchema>(
        category: ToolCategory,
        readonly: bool,
        meta: ToolMeta,
        handler: ToolHandler,
    ) -> Self {
        let annotations = ToolAnnotations::with_title(meta.title)
            .read_only(readonly)
            .destructive(!readonly)
            .idempotent(readonly)
            .open_world(true);
        let spec =
            Tool::new(meta.name, meta.description, input_schema::<I>()).annotate(annotations);
        Self {
            category,
            readonly,
            spec,
            handler,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub async fn call(&self, call: ToolCall) -> CallToolResult {
        (self.handler)(call).await
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name())
            .field("category", &self.category)
            .field("readonly", &self.readonly)
            .finish_non_exhaustive()
    }
}

/// Settings the catalog needs beyond the engine handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Records sampled per table by the schema tool.
    pub schema_sample_size: u32,
    /// Whether the schema tool may ask `fn::schema_summary` first.
    pub schema_helper_available: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            schema_sample_size: 100,
            schema_helper_available: false,
        }
    }
}

/// Builds the full catalog, hidden and optional tools included.
#[must_use]
pub fn build_catalog<E: QueryEngine>(
    engine: &Arc<E>,
    settings: CatalogSettings,
) -> Vec<ToolDescriptor> {
    let mut catalog = lineage::core_tools(engine);
    catalog.extend(stats::core_tools(engine));
    catalog.push(extension::lineage_functions_tool(engine));
    catalog.extend(graph::hidden_tools(engine, settings));
    catalog
}

fn input_schema<I: JsonSchema>() -> Arc<JsonObject> {
    let schema = rmcp::schemars::schema_for!(I);
    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(map)) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use lineage_core::auth::AuthContext;
    use lineage_core::engine::mock::ScriptedEngine;

    use super::*;

    fn catalog() -> Vec<ToolDescriptor> {
        build_catalog(&Arc::new(ScriptedEngine::new()), CatalogSettings::default())
    }

    fn count(catalog: &[ToolDescriptor], category: ToolCategory) -> usize {
        catalog.iter().filter(|tool| tool.category == category).count()
    }

    #[test]
    fn catalog_names_are_unique() {
        let catalog = catalog();
        let names: HashSet<&str> = catalog.iter().map(ToolDescriptor::name).collect();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn catalog_has_expected_categories() {
        let catalog = catalog();
        assert_eq!(count(&catalog, ToolCategory::Core), 17);
        assert_eq!(count(&catalog, ToolCategory::OptionalCapability), 1);
        assert_eq!(count(&catalog, ToolCategory::Hidden), 3);
    }

    #[test]
    fn only_the_write_tool_is_mutating() {
        let catalog = catalog();
        let mutating: Vec<&ToolDescriptor> =
            catalog.iter().filter(|tool| !tool.readonly).collect();
        assert_eq!(mutating.len(), 1);
        assert_eq!(mutating[0].name(), "write-query");
        assert_eq!(mutating[0].category, ToolCategory::Hidden);
    }

    #[test]
    fn core_tools_are_annotated_read_only() {
        for tool in catalog().iter().filter(|t| t.category == ToolCategory::Core) {
            let annotations = tool
                .spec
                .annotations
                .as_ref()
                .expect("core tools carry annotations");
            assert_eq!(annotations.read_only_hint, Some(true), "{}", tool.name());
            assert_eq!(annotations.destructive_hint, Some(false), "{}", tool.name());
            assert_eq!(annotations.idempotent_hint, Some(true), "{}", tool.name());
            assert_eq!(annotations.open_world_hint, Some(true), "{}", tool.name());
        }
    }

    #[test]
    fn input_schemas_are_objects() {
        for tool in catalog() {
            assert_eq!(
                tool.spec.input_schema.get("type"),
                Some(&serde_json::json!("object")),
                "{}",
                tool.name()
            );
        }
    }

    #[tokio::test]
    async fn exposed_tools_issue_one_statement_per_call() {
        let engine = Arc::new(ScriptedEngine::new());
        let catalog = build_catalog(&engine, CatalogSettings::default());
        let arguments = serde_json::json!({
            "guid": "G1",
            "query": "revenue",
            "searchTerm": "revenue",
            "direction": "upstream",
        });
        let auth = AuthContext::BearerToken {
            token: "sso".to_string(),
        };
        for tool in catalog.iter().filter(|tool| tool.category != ToolCategory::Hidden) {
            let before = engine.calls().len();
            let result = tool
                .call(ToolCall {
                    tool: tool.name().to_string(),
                    arguments: arguments.as_object().cloned().unwrap_or_default(),
                    auth: auth.clone(),
                })
                .await;
            assert_ne!(result.is_error, Some(true), "{}", tool.name());
            assert_eq!(engine.calls().len() - before, 1, "{}", tool.name());
        }
    }
}
