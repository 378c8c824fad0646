//! Scripted in-memory engine for tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::auth::AuthContext;
use crate::engine::{EngineError, EngineResult, QueryEngine, QueryParams, Record};

#[derive(Debug, Clone)]
enum Outcome {
    Rows(Vec<Record>),
    QueryError(String),
    ConnectionError(String),
}

impl Outcome {
    fn resolve(&self) -> EngineResult<Vec<Record>> {
        match self {
            Self::Rows(rows) => Ok(rows.clone()),
            Self::QueryError(message) => Err(EngineError::Query(message.clone())),
            Self::ConnectionError(message) => Err(EngineError::Connection(message.clone())),
        }
    }
}

/// A statement the engine was asked to run.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub query: String,
    pub params: QueryParams,
    pub auth: AuthContext,
    pub write: bool,
}

/// Engine that answers statements from a script keyed by query text.
///
/// Statements without a scripted outcome return no rows.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    connectivity_failure: Option<String>,
    outcomes: HashMap<String, Outcome>,
    calls: Mutex<Vec<RecordedQuery>>,
}

impl ScriptedEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_connectivity_failure(mut self, message: impl Into<String>) -> Self {
        self.connectivity_failure = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_rows(mut self, query: &str, rows: Vec<Record>) -> Self {
        self.outcomes.insert(query.to_string(), Outcome::Rows(rows));
        self
    }

    #[must_use]
    pub fn with_query_error(mut self, query: &str, message: impl Into<String>) -> Self {
        self.outcomes
            .insert(query.to_string(), Outcome::QueryError(message.into()));
        self
    }

    #[must_use]
    pub fn with_connection_error(mut self, query: &str, message: impl Into<String>) -> Self {
        self.outcomes
            .insert(query.to_string(), Outcome::ConnectionError(message.into()));
        self
    }

    /// Statements received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedQuery> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn run(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
        write: bool,
    ) -> EngineResult<Vec<Record>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedQuery {
                query: query.to_string(),
                params,
                auth: auth.clone(),
                write,
            });
        self.outcomes
            .get(query)
            .map_or_else(|| Ok(Vec::new()), Outcome::resolve)
    }
}

impl QueryEngine for ScriptedEngine {
    async fn verify_connectivity(&self) -> EngineResult<()> {
        self.connectivity_failure
            .as_ref()
            .map_or(Ok(()), |message| Err(EngineError::Connection(message.clone())))
    }

    async fn execute_read_query(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
    ) -> EngineResult<Vec<Record>> {
        self.run(auth, query, params, false)
    }

    async fn execute_write_query(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
    ) -> EngineResult<Vec<Record>> {
        self.run(auth, query, params, true)
    }
}
