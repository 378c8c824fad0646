//! Query engine seam.
//!
//! The lineage graph is queried through [`QueryEngine`]; traversal itself runs
//! inside the database. [`SurrealEngine`] is the production implementation.

#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod surreal;

use std::future::Future;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::AuthContext;

pub use surreal::{SurrealEngine, SurrealSettings};

/// One result row.
pub type Record = Value;
/// Named bind parameters for a statement.
pub type QueryParams = Map<String, Value>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached or the session could not be set up.
    #[error("query engine connection failed: {0}")]
    Connection(String),
    /// The engine rejected the supplied credentials.
    #[error("query engine authentication failed: {0}")]
    Auth(String),
    /// The engine evaluated the statement and reported an error.
    #[error("query failed: {0}")]
    Query(String),
    /// Rows could not be converted to or from JSON.
    #[error("failed to convert query results: {0}")]
    Serialization(String),
}

impl EngineError {
    /// True when the engine itself rejected the statement, as opposed to a
    /// transport or credential failure.
    #[must_use]
    pub const fn is_query_error(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Access to the external graph database.
pub trait QueryEngine: Send + Sync + 'static {
    /// Performs the network and credential handshake with the engine.
    fn verify_connectivity(&self) -> impl Future<Output = EngineResult<()>> + Send;

    /// Runs a read statement using the identity selected by `auth`.
    fn execute_read_query(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
    ) -> impl Future<Output = EngineResult<Vec<Record>>> + Send;

    /// Runs a statement that may modify the graph.
    fn execute_write_query(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
    ) -> impl Future<Output = EngineResult<Vec<Record>>> + Send;

    /// Formats rows as the text returned to MCP clients.
    ///
    /// # Errors
    /// Returns `EngineError::Serialization` if the rows cannot be encoded.
    fn records_to_json(&self, records: &[Record]) -> EngineResult<String> {
        records_to_json(records)
    }
}

/// Pretty-printed JSON array of rows.
///
/// # Errors
/// Returns `EngineError::Serialization` if the rows cannot be encoded.
pub fn records_to_json(records: &[Record]) -> EngineResult<String> {
    serde_json::to_string_pretty(records).map_err(|err| EngineError::Serialization(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_render_as_a_json_array() {
        let rendered = records_to_json(&[json!({"name": "Revenue", "reports": 3})])
            .expect("rows should encode");
        let parsed: Value = serde_json::from_str(&rendered).expect("output should be JSON");
        assert_eq!(parsed, json!([{"name": "Revenue", "reports": 3}]));
    }

    #[test]
    fn only_engine_rejections_count_as_query_errors() {
        assert!(EngineError::Query("no such function".to_string()).is_query_error());
        assert!(!EngineError::Connection("refused".to_string()).is_query_error());
        assert!(!EngineError::Auth("denied".to_string()).is_query_error());
    }
}
