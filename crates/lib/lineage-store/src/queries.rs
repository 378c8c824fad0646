//! Fixed `SurrealQL` statements issued by the lineage tools.
//!
//! Every statement is parameterised; list-valued filters are always bound as
//! arrays (empty means "no filter") and string filters as strings (empty means
//! "no filter"). Multi-statement texts return the result of their last
//! statement. Paginated statements take `$offset` and `$page_size` and report
//! `moreResults` when rows remain past the current page.

/// Liveness probe for the read path.
pub const PROBE_READ: &str = "RETURN 1;";

/// Database definitions, used to detect user-defined helper functions.
pub const PROBE_SCHEMA_HELPER: &str = "INFO FOR DB;";

/// Succeeds only when the lineage analytics module is installed.
pub const PROBE_EXTENSION: &str = "RETURN fn::lineage_version();";

/// Details for Metrics or Attributes by exact GUID.
///
/// Parameters: `$object_type`, `$guids`.
pub const OBJECT_DETAILS: &str = r"
SELECT
    type AS Type,
    guid AS GUID,
    name AS Name,
    updated_parity_status ?? parity_status ?? 'No Status' AS Status,
    parity_group AS `Group`,
    parity_subgroup AS SubGroup,
    parity_team AS Team,
    inherited_priority_level AS Priority,
    formula AS Formula,
    db_raw AS RAW,
    db_serve AS SERVE,
    pb_semantic AS SEMANTIC,
    edw_table AS EDWTable,
    edw_column AS EDWColumn,
    ade_db_table AS ADETable,
    ade_db_column AS ADEColumn,
    pb_semantic_name AS SemanticName,
    pb_semantic_model AS SemanticModel,
    db_essential AS DBEssential,
    pb_essential AS PBEssential,
    parity_notes AS Notes,
    lineage_used_by_reports_count ?? 0 AS ReportCount,
    lineage_source_tables_count ?? 0 AS TableCount
FROM mstr_object
WHERE type = $object_type AND guid IN $guids
LIMIT 100;
";

/// Metrics whose GUID or name contains the search text.
///
/// Parameters: `$query`, `$statuses`, `$offset`, `$page_size`.
pub const SEARCH_METRICS: &str = r"
LET $needle = string::lowercase(string::trim($query));
LET $rows = SELECT
        type,
        guid,
        name,
        updated_parity_status ?? parity_status ?? 'No Status' AS status,
        inherited_priority_level AS priority,
        parity_team AS team,
        lineage_used_by_reports_count ?? 0 AS reports,
        lineage_source_tables_count ?? 0 AS tables
    FROM mstr_object
    WHERE type = 'Metric'
        AND guid != NONE
        AND (string::contains(string::lowercase(guid), $needle)
            OR string::contains(string::lowercase(name ?? ''), $needle))
    ORDER BY reports DESC, name ASC;
LET $matched = IF array::len($statuses) = 0 { $rows } ELSE { $rows[WHERE status IN $statuses] };
LET $page = array::slice($matched, $offset, $page_size + 1);
RETURN IF array::len($page) = 0 { [] } ELSE {
    [{ results: array::slice($page, 0, $page_size), moreResults: array::len($page) > $page_size }]
};
";

/// Prioritised objects of one type, filtered by report usage and parity.
///
/// Parameters: `$object_type`, `$search_terms` (lowercased), `$priority_levels`,
/// `$business_areas`, `$statuses`, `$data_domains`, `$offset`, `$page_size`.
pub const SEARCH_OBJECTS: &str = r"
LET $rows = SELECT * FROM (
    SELECT
        type,
        name,
        guid,
        updated_parity_status ?? parity_status ?? 'No Status' AS status,
        inherited_priority_level AS priority,
        parity_team AS team,
        lineage_source_tables_count ?? 0 AS tables,
        array::len(array::distinct(
            id.{1..2+collect}(<-depends_on<-mstr_object)[WHERE
                type IN ['Report', 'GridReport', 'Document']
                AND priority_level != NONE
                AND (array::len($priority_levels) = 0 OR priority_level IN $priority_levels)
                AND (array::len($business_areas) = 0 OR usage_area IN $business_areas)
            ]
        )) AS reports
    FROM mstr_object
    WHERE type = $object_type
        AND guid != NONE
        AND inherited_priority_level != NONE
        AND (array::len($search_terms) = 0 OR $search_terms.any(|$term|
            string::contains(string::lowercase(name ?? ''), $term)
            OR string::contains(string::lowercase(guid), $term)))
        AND (array::len($data_domains) = 0
            OR array::len(array::intersect($data_domains, <-belongs_to<-data_product.name)) = array::len($data_domains))
)
WHERE reports > 0
    AND (array::len($statuses) = 0 OR status IN $statuses)
ORDER BY reports DESC, name ASC;
LET $page = array::slice($rows, $offset, $page_size + 1);
RETURN IF array::len($page) = 0 { [] } ELSE {
    [{ results: array::slice($page, 0, $page_size), moreResults: array::len($page) > $page_size }]
};
";

/// Reports reaching the object directly or through Prompts and Filters.
///
/// Parameters: `$guids`, `$priority_levels`, `$business_areas`, `$offset`, `$page_size`.
pub const REPORTS_USING_OBJECT: &str = r"
SELECT
    objectName,
    objectGUID,
    objectType,
    array::len(allReports) AS totalReports,
    array::slice(allReports, $offset, $page_size) AS reports,
    array::len(allReports) > $offset + $page_size AS moreResults
FROM (
    SELECT
        name AS objectName,
        guid AS objectGUID,
        type AS objectType,
        (SELECT
                name,
                guid,
                type,
                priority_level AS priority,
                usage_area AS area,
                usage_department AS department,
                usage_users_count AS users
            FROM array::distinct($parent.id.{1..10+collect}(<-depends_on<-mstr_object[WHERE
                type IN ['Prompt', 'Filter', 'Report', 'GridReport', 'Document']
            ]))
            WHERE type IN ['Report', 'GridReport', 'Document']
                AND priority_level != NONE
                AND (array::len($priority_levels) = 0 OR priority_level IN $priority_levels)
                AND (array::len($business_areas) = 0 OR usage_area IN $business_areas)
            ORDER BY name ASC
        ) AS allReports
    FROM mstr_object
    WHERE guid IN $guids
);
";

/// Logical and physical tables reached through Facts, Metrics, Attributes and Columns.
///
/// Parameters: `$guids`, `$offset`, `$page_size`.
pub const SOURCE_TABLES: &str = r"
SELECT
    objectName,
    objectGUID,
    objectType,
    array::len(allTables) AS totalTables,
    array::slice(allTables, $offset, $page_size) AS tables,
    array::len(allTables) > $offset + $page_size AS moreResults
FROM (
    SELECT
        name AS objectName,
        guid AS objectGUID,
        type AS objectType,
        (SELECT
                name,
                guid,
                type,
                physical_table_name AS physicalTable,
                database_instance AS database
            FROM array::distinct($parent.id.{1..10+collect}(->depends_on->mstr_object[WHERE
                type IN ['Fact', 'Metric', 'Attribute', 'Column', 'LogicalTable', 'Table']
            ]))
            WHERE type IN ['LogicalTable', 'Table']
            ORDER BY name ASC
        ) AS allTables
    FROM mstr_object
    WHERE guid IN $guids
);
";

/// Direct dependencies of the object plus a transitive source table count.
///
/// Parameters: `$guids`, `$offset`, `$page_size`.
pub const DOWNSTREAM_DEPENDENCIES: &str = r"
SELECT
    objectName,
    objectGUID,
    objectType,
    array::len(allDirect) AS totalDirectDeps,
    transitiveTableCount,
    array::slice(allDirect, $offset, $page_size) AS directDependencies,
    array::len(allDirect) > $offset + $page_size AS moreResults
FROM (
    SELECT
        name AS objectName,
        guid AS objectGUID,
        type AS objectType,
        (SELECT type, name, guid, formula
            FROM array::distinct($parent.id->depends_on->mstr_object)
            ORDER BY name ASC
        ) AS allDirect,
        array::len(array::distinct(id.{2..10+collect}(->depends_on->mstr_object[WHERE
            type IN ['Fact', 'Metric', 'Attribute', 'Column', 'LogicalTable', 'Table']
        ]))[WHERE type IN ['LogicalTable', 'Table']]) AS transitiveTableCount
    FROM mstr_object
    WHERE guid IN $guids
);
";

/// Reports, GridReports and Documents that depend on the object.
///
/// Parameters: `$guids`, `$offset`, `$page_size`.
pub const UPSTREAM_DEPENDENCIES: &str = r"
SELECT
    objectName,
    objectGUID,
    objectType,
    array::len(allReports) AS totalReports,
    array::slice(allReports, $offset, $page_size) AS reports,
    array::len(allReports) > $offset + $page_size AS moreResults
FROM (
    SELECT
        name AS objectName,
        guid AS objectGUID,
        type AS objectType,
        (SELECT
                name,
                guid,
                type,
                priority_level AS priority,
                usage_area AS area,
                usage_department AS department,
                usage_users_count AS users
            FROM array::distinct($parent.id.{1..10+collect}(<-depends_on<-mstr_object[WHERE
                type IN ['Prompt', 'Filter', 'Report', 'GridReport', 'Document']
            ]))
            WHERE type IN ['Report', 'GridReport', 'Document']
            ORDER BY name ASC
        ) AS allReports
    FROM mstr_object
    WHERE guid IN $guids
);
";

/// Parity status totals for every object of one type.
///
/// Parameters: `$object_type`, `$statuses`, `$team`.
pub const OBJECT_TYPE_STATS: &str = r"
LET $rows = SELECT
        updated_parity_status ?? parity_status ?? 'No Status' AS status,
        parity_team AS team,
        inherited_priority_level AS priority
    FROM mstr_object
    WHERE type = $object_type AND guid != NONE;
LET $scoped = $rows[WHERE (array::len($statuses) = 0 OR status IN $statuses)
    AND ($team = '' OR team = $team)];
RETURN IF array::len($scoped) = 0 { [] } ELSE {
    [{
        total: array::len($scoped),
        complete: array::len($scoped[WHERE status = 'Complete']),
        planned: array::len($scoped[WHERE status = 'Planned']),
        notPlanned: array::len($scoped[WHERE status = 'Not Planned']),
        noStatus: array::len($scoped[WHERE status = 'No Status']),
        prioritized: array::len($scoped[WHERE priority != NONE]),
        teams: array::distinct($scoped[WHERE team != NONE].team)
    }]
};
";

/// Report and table counts for a single object, with reports grouped by priority.
///
/// Parameters: `$guid`.
pub const OBJECT_STATS: &str = r"
LET $node = (SELECT * FROM mstr_object WHERE guid = $guid LIMIT 1)[0];
LET $reports = IF $node = NONE { [] } ELSE {
    (SELECT name, priority_level
        FROM array::distinct($node.id.{1..10+collect}(<-depends_on<-mstr_object[WHERE
            type IN ['Prompt', 'Filter', 'Report', 'GridReport', 'Document']
        ]))
        WHERE type IN ['Report', 'GridReport', 'Document'])
};
LET $tables = IF $node = NONE { [] } ELSE {
    array::distinct($node.id.{1..10+collect}(->depends_on->mstr_object[WHERE
        type IN ['Fact', 'Metric', 'Attribute', 'Column', 'LogicalTable', 'Table']
    ]))[WHERE type IN ['LogicalTable', 'Table']]
};
RETURN IF $node = NONE { [] } ELSE {
    [{
        name: $node.name,
        type: $node.type,
        guid: $node.guid,
        status: $node.updated_parity_status ?? $node.parity_status ?? 'No Status',
        team: $node.parity_team,
        reportCount: array::len($reports),
        tableCount: array::len($tables),
        reportsByPriority: (SELECT priority_level AS priority, count() AS count
            FROM $reports
            WHERE priority_level != NONE
            GROUP BY priority_level)
    }]
};
";

/// Live lineage walk for one Metric or Attribute in a single direction.
///
/// Parameters: `$guid`, `$object_type`, `$direction` (`downstream` or
/// `upstream`), `$offset`, `$page_size`.
pub const TRACE_OBJECT: &str = r"
LET $node = (SELECT * FROM mstr_object WHERE guid = $guid AND type = $object_type LIMIT 1)[0];
LET $object = IF $node = NONE { NONE } ELSE {
    {
        type: $node.type,
        guid: $node.guid,
        name: $node.name,
        status: $node.updated_parity_status ?? $node.parity_status ?? 'No Status',
        priority: $node.inherited_priority_level,
        formula: $node.formula,
        notes: $node.updated_parity_notes ?? $node.parity_notes,
        raw: $node.updated_db_raw ?? $node.db_raw,
        serve: $node.updated_db_serve ?? $node.db_serve,
        semantic: $node.pb_semantic,
        edwTable: $node.updated_edw_table ?? $node.edw_table,
        edwColumn: $node.edw_column,
        adeTable: $node.updated_ade_db_table ?? $node.ade_db_table,
        adeColumn: $node.ade_db_column,
        semanticName: $node.pb_semantic_name,
        semanticModel: $node.pb_semantic_model,
        dbEssential: $node.db_essential,
        pbEssential: $node.pb_essential,
        adoLink: $node.updated_ado_link ?? $node.ado_link
    }
};
LET $fetched = IF $node = NONE { [] } ELSE IF $direction = 'downstream' {
    (SELECT name, guid, type, priority_level AS priority, usage_area AS area
        FROM array::distinct($node.id.{1..10+collect}(<-depends_on<-mstr_object))
        WHERE type IN ['Report', 'GridReport', 'Document'] AND priority_level != NONE
        ORDER BY name ASC
        LIMIT $page_size + 1
        START $offset)
} ELSE {
    (SELECT name, guid, type, physical_table_name AS physicalTable, database_instance AS database
        FROM array::distinct($node.id.{1..10+collect}(->depends_on->mstr_object))
        WHERE type IN ['LogicalTable', 'Table']
        ORDER BY name ASC
        LIMIT $page_size + 1
        START $offset)
};
LET $dependencies = IF $node = NONE OR $direction = 'downstream' { [] } ELSE {
    array::slice((SELECT name, guid, type, formula
        FROM array::distinct($node.id.{1..2+collect}(->depends_on->mstr_object))
        WHERE type IN ['Fact', 'Metric', 'Attribute', 'DerivedMetric', 'Column', 'Transformation']
        ORDER BY name ASC), 0, $page_size)
};
RETURN IF $node = NONE { [] } ELSE IF $direction = 'downstream' {
    [{
        object: $object,
        direction: 'downstream',
        reports: array::slice($fetched, 0, $page_size),
        moreResults: array::len($fetched) > $page_size
    }]
} ELSE {
    [{
        object: $object,
        direction: 'upstream',
        tables: array::slice($fetched, 0, $page_size),
        moreResults: array::len($fetched) > $page_size,
        dependencies: $dependencies
    }]
};
";

/// Version and function list reported by the lineage analytics module.
pub const EXTENSION_FUNCTIONS: &str = r"
RETURN [{ version: fn::lineage_version(), functions: fn::lineage_functions() }];
";

/// Sample of records from one table, used by the schema tool.
///
/// Parameters: `$table`, `$limit`.
pub const SAMPLE_TABLE: &str = "SELECT * FROM type::table($table) LIMIT $limit;";

/// Schema description produced by the user-defined helper, when installed.
pub const SCHEMA_SUMMARY: &str = "RETURN fn::schema_summary();";
