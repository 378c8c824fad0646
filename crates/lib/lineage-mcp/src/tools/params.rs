//! Tool arguments and their mapping onto query parameters.

use lineage_core::engine::QueryParams;
use lineage_store::schema::{ALL_AREAS, ALL_DOMAINS, ALL_PRIORITIZED, ALL_STATUS, PAGE_SIZE};
use rmcp::model::JsonObject;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GuidParams {
    /// Full GUID of the object. Exact match required.
    pub guid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PagedGuidParams {
    /// Full GUID of the object. Exact match required.
    pub guid: String,
    /// Rows to skip. Pages hold 100 rows.
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportUsageParams {
    /// Full GUID of the object. Exact match required.
    pub guid: String,
    /// Report priority labels such as `P1 (Highest)`. Empty or
    /// `All Prioritized` disables the filter.
    #[serde(default)]
    pub priority_level: Vec<String>,
    /// Business areas of the reports. Empty or `All Areas` disables the filter.
    #[serde(default)]
    pub business_area: Vec<String>,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchMetricsParams {
    /// Text matched against Metric names and GUIDs, case-insensitive.
    pub query: String,
    /// Parity statuses to keep. Empty or `All Status` disables the filter.
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchObjectsParams {
    /// Comma-separated terms matched against names and GUIDs.
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub priority_level: Vec<String>,
    #[serde(default)]
    pub business_area: Vec<String>,
    #[serde(default)]
    pub status: Vec<String>,
    /// Data domains of the owning data products. Empty or `All Domains`
    /// disables the filter.
    #[serde(default)]
    pub data_domain: Vec<String>,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StatsParams {
    #[serde(default)]
    pub status: Vec<String>,
    /// Parity team. Empty means every team.
    #[serde(default)]
    pub team: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TraceDirection {
    /// Towards the reports that use the object.
    Downstream,
    /// Towards the tables the object is sourced from.
    Upstream,
}

impl TraceDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downstream => "downstream",
            Self::Upstream => "upstream",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TraceParams {
    /// Full GUID of the object. Exact match required.
    pub guid: String,
    pub direction: TraceDirection,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NoParams {}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RawQueryParams {
    /// `SurrealQL` statement text.
    pub query: String,
    /// Named bind parameters, referenced as `$name` in the statement.
    #[serde(default)]
    pub params: JsonObject,
}

/// Builds query parameters from name and value pairs.
#[must_use]
pub fn query_params<const N: usize>(entries: [(&str, Value); N]) -> QueryParams {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Adds `$offset` and `$page_size`.
#[must_use]
pub fn with_page(mut params: QueryParams, offset: u32) -> QueryParams {
    params.insert("offset".to_string(), json!(offset));
    params.insert("page_size".to_string(), json!(PAGE_SIZE));
    params
}

/// Trimmed value of a required string argument.
///
/// # Errors
/// Returns the message reported to the client when the value is blank.
pub fn required(value: &str, name: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("{name} parameter is required"))
    } else {
        Ok(value.to_string())
    }
}

/// Drops blank entries. A list containing `sentinel` means "no filter".
#[must_use]
pub fn filter_values(values: Vec<String>, sentinel: &str) -> Vec<String> {
    if values.iter().any(|value| value.trim() == sentinel) {
        return Vec::new();
    }
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[must_use]
pub fn statuses(values: Vec<String>) -> Vec<String> {
    filter_values(values, ALL_STATUS)
}

#[must_use]
pub fn business_areas(values: Vec<String>) -> Vec<String> {
    filter_values(values, ALL_AREAS)
}

#[must_use]
pub fn data_domains(values: Vec<String>) -> Vec<String> {
    filter_values(values, ALL_DOMAINS)
}

/// Maps labels like `P1 (Highest)`, `P3` or `2` to priority numbers.
///
/// # Errors
/// Returns a message naming the first label that is not a priority.
pub fn priority_levels(labels: Vec<String>) -> Result<Vec<i64>, String> {
    filter_values(labels, ALL_PRIORITIZED)
        .iter()
        .map(|label| {
            parse_priority(label).ok_or_else(|| format!("invalid priorityLevel value: {label}"))
        })
        .collect()
}

fn parse_priority(label: &str) -> Option<i64> {
    let head = label.split_whitespace().next()?;
    let digits = head
        .strip_prefix('P')
        .or_else(|| head.strip_prefix('p'))
        .unwrap_or(head);
    digits.parse().ok()
}

/// Lowercased, comma-separated search terms.
#[must_use]
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn priority_labels_become_numbers() {
        assert_eq!(
            priority_levels(strings(&["P1 (Highest)", "P3", " 2 ", "p5 (Lowest)"])),
            Ok(vec![1, 3, 2, 5])
        );
    }

    #[test]
    fn all_prioritized_disables_the_priority_filter() {
        assert_eq!(
            priority_levels(strings(&["P1 (Highest)", "All Prioritized"])),
            Ok(Vec::new())
        );
        assert_eq!(priority_levels(Vec::new()), Ok(Vec::new()));
    }

    #[test]
    fn unknown_priority_labels_are_rejected() {
        assert_eq!(
            priority_levels(strings(&["High"])),
            Err("invalid priorityLevel value: High".to_string())
        );
    }

    #[test]
    fn sentinels_clear_their_filters() {
        assert!(statuses(strings(&["Complete", "All Status"])).is_empty());
        assert!(business_areas(strings(&["All Areas"])).is_empty());
        assert!(data_domains(strings(&["Finance", "All Domains"])).is_empty());
        assert_eq!(
            statuses(strings(&[" Planned ", ""])),
            strings(&["Planned"])
        );
    }

    #[test]
    fn blank_required_values_name_the_parameter() {
        assert_eq!(required("  ", "guid"), Err("guid parameter is required".to_string()));
        assert_eq!(required(" ABC ", "guid"), Ok("ABC".to_string()));
    }

    #[test]
    fn search_terms_split_on_commas() {
        assert_eq!(
            search_terms("Revenue, GROSS margin,,"),
            strings(&["revenue", "gross margin"])
        );
        assert!(search_terms("  ").is_empty());
    }

    #[test]
    fn paging_uses_the_fixed_page_size() {
        let params = with_page(query_params([("guid", json!("G"))]), 200);
        assert_eq!(params.get("offset"), Some(&json!(200)));
        assert_eq!(params.get("page_size"), Some(&json!(100)));
        assert_eq!(params.get("guid"), Some(&json!("G")));
    }

    #[test]
    fn trace_direction_parses_lowercase_names() {
        let params: TraceParams =
            serde_json::from_value(json!({"guid": "G", "direction": "upstream"}))
                .expect("valid trace arguments");
        assert_eq!(params.direction, TraceDirection::Upstream);
        assert_eq!(params.offset, 0);
        assert!(
            serde_json::from_value::<TraceParams>(json!({"guid": "G", "direction": "sideways"}))
                .is_err()
        );
    }
}
