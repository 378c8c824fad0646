//! Filter pipeline deriving the registered tool set.
//!
//! Each filter is a pure predicate over one descriptor and the startup
//! inputs. Filters only remove tools and look at disjoint descriptor fields,
//! so the order they run in does not change the result.

use lineage_core::capabilities::ServerCapabilities;
use lineage_core::config::RuntimeConfig;
use rmcp::model::Tool;

use super::{ToolCategory, ToolDescriptor};

/// Startup inputs shared by every filter.
#[derive(Debug, Clone, Copy)]
pub struct FilterInputs<'a> {
    pub config: &'a RuntimeConfig,
    pub capabilities: &'a ServerCapabilities,
}

/// Returns true to keep the tool.
pub type ToolFilter = fn(&ToolDescriptor, FilterInputs<'_>) -> bool;

/// In read-only mode only read-only tools are kept.
#[must_use]
pub const fn readonly_filter(tool: &ToolDescriptor, inputs: FilterInputs<'_>) -> bool {
    !inputs.config.read_only || tool.readonly
}

/// Optional tools are kept only when the analytics module is installed.
#[must_use]
pub fn optional_capability_filter(tool: &ToolDescriptor, inputs: FilterInputs<'_>) -> bool {
    tool.category != ToolCategory::OptionalCapability
        || inputs.capabilities.optional_feature_installed()
}

/// Hidden tools are never kept.
#[must_use]
pub fn hidden_filter(tool: &ToolDescriptor, _inputs: FilterInputs<'_>) -> bool {
    tool.category != ToolCategory::Hidden
}

pub const DEFAULT_FILTERS: [ToolFilter; 3] =
    [readonly_filter, optional_capability_filter, hidden_filter];

/// Applies `filters` in order to the catalog.
#[must_use]
pub fn apply_filters(
    catalog: Vec<ToolDescriptor>,
    filters: &[ToolFilter],
    inputs: FilterInputs<'_>,
) -> Vec<ToolDescriptor> {
    filters.iter().fold(catalog, |tools, filter| {
        tools
            .into_iter()
            .filter(|tool| filter(tool, inputs))
            .collect()
    })
}

/// Tools exposed by one server instance. Computed once at startup.
#[derive(Debug, Clone, Default)]
pub struct RegisteredToolSet {
    tools: Vec<ToolDescriptor>,
}

impl RegisteredToolSet {
    /// Runs the default pipeline over the catalog.
    #[must_use]
    pub fn register(
        catalog: Vec<ToolDescriptor>,
        config: &RuntimeConfig,
        capabilities: &ServerCapabilities,
    ) -> Self {
        let inputs = FilterInputs {
            config,
            capabilities,
        };
        Self {
            tools: apply_filters(catalog, &DEFAULT_FILTERS, inputs),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    #[must_use]
    pub fn specs(&self) -> Vec<Tool> {
        self.tools.iter().map(|tool| tool.spec.clone()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(ToolDescriptor::name)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
