pub const TABLE_OBJECT: &str = "mstr_object";
pub const TABLE_DATA_PRODUCT: &str = "data_product";

/// `dependent -> depends_on -> dependency`
pub const REL_DEPENDS_ON: &str = "depends_on";
/// `data_product -> belongs_to -> mstr_object`
pub const REL_BELONGS_TO: &str = "belongs_to";

pub const TYPE_METRIC: &str = "Metric";
pub const TYPE_ATTRIBUTE: &str = "Attribute";

/// Object types that count as a report when walking toward consumers.
pub const REPORT_TYPES: [&str; 3] = ["Report", "GridReport", "Document"];
/// Intermediate types allowed between a report and the object it uses.
pub const REPORT_PATH_TYPES: [&str; 2] = ["Prompt", "Filter"];
/// Object types that count as a physical source.
pub const TABLE_TYPES: [&str; 2] = ["LogicalTable", "Table"];
/// Intermediate types allowed between an object and its source tables.
pub const SOURCE_PATH_TYPES: [&str; 4] = ["Fact", "Metric", "Attribute", "Column"];

pub const STATUS_COMPLETE: &str = "Complete";
pub const STATUS_PLANNED: &str = "Planned";
pub const STATUS_NOT_PLANNED: &str = "Not Planned";
pub const STATUS_NONE: &str = "No Status";

/// Filter values that mean "do not filter on this dimension".
pub const ALL_PRIORITIZED: &str = "All Prioritized";
pub const ALL_AREAS: &str = "All Areas";
pub const ALL_STATUS: &str = "All Status";
pub const ALL_DOMAINS: &str = "All Domains";

/// Rows returned per page by paginated tools.
pub const PAGE_SIZE: u32 = 100;
/// Longest `depends_on` walk issued by the lineage statements.
pub const MAX_TRAVERSAL_DEPTH: u32 = 10;

/// User-defined function that summarises the schema when installed.
pub const SCHEMA_HELPER_FUNCTION: &str = "schema_summary";
/// Prefix shared by the lineage analytics module functions.
pub const EXTENSION_FUNCTION_PREFIX: &str = "lineage_";
