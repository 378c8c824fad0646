//! Graph schema and query texts for mstr-lineage-mcp.
//!
//! This crate describes the shape of the MicroStrategy lineage graph as it is
//! stored in `SurrealDB`: object and relation tables, the object type groups
//! used while walking `depends_on` edges, and the fixed `SurrealQL` statements
//! issued by the MCP tools.

pub mod models;
pub mod queries;
pub mod schema;

pub use models::*;
