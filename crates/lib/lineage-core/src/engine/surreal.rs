use std::fmt;

use serde_json::Value;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::debug;

use crate::auth::AuthContext;
use crate::engine::{EngineError, EngineResult, QueryEngine, QueryParams, Record};

/// Connection settings for the lineage database.
#[derive(Clone)]
pub struct SurrealSettings {
    /// Endpoint understood by the `any` engine, e.g. `ws://host:8000` or `mem://`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    /// Server-side identity used for the shared session.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for SurrealSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurrealSettings")
            .field("endpoint", &self.endpoint)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `SurrealDB`-backed query engine.
///
/// Requests authenticated with the server's shared identity (API token mode
/// or stdio) reuse one session. Requests carrying their own credentials get a
/// dedicated session signed in with those credentials.
///
/// A dedicated session costs a connection and a sign-in round trip per
/// statement. Registered tools issue one statement per call, so that is one
/// sign-in per request. Caller sessions are never kept past the statement.
pub struct SurrealEngine {
    settings: SurrealSettings,
    shared: Surreal<Any>,
}

impl SurrealEngine {
    /// Opens the shared session and selects the namespace and database.
    ///
    /// # Errors
    /// Returns `EngineError::Connection` if the endpoint cannot be reached and
    /// `EngineError::Auth` if the configured credentials are rejected.
    pub async fn connect(settings: SurrealSettings) -> EngineResult<Self> {
        let shared = open(&settings.endpoint).await?;
        if let (Some(username), Some(password)) =
            (settings.username.as_deref(), settings.password.as_deref())
        {
            shared
                .signin(Root { username, password })
                .await
                .map_err(auth_error)?;
        }
        select(&shared, &settings).await?;
        Ok(Self { settings, shared })
    }

    async fn session_for(&self, auth: &AuthContext) -> EngineResult<Surreal<Any>> {
        match auth {
            AuthContext::None | AuthContext::ApiTokenAuthenticated => Ok(self.shared.clone()),
            AuthContext::BasicCredentials { user, pass } => {
                let db = open(&self.settings.endpoint).await?;
                db.signin(Root {
                    username: user,
                    password: pass,
                })
                .await
                .map_err(auth_error)?;
                select(&db, &self.settings).await?;
                Ok(db)
            }
            AuthContext::BearerToken { token } => {
                let db = open(&self.settings.endpoint).await?;
                db.authenticate(token.clone()).await.map_err(auth_error)?;
                select(&db, &self.settings).await?;
                Ok(db)
            }
        }
    }

    async fn run(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
    ) -> EngineResult<Vec<Record>> {
        let db = self.session_for(auth).await?;
        debug!(auth = auth.mode(), "executing statement");
        execute(&db, query, params).await
    }
}

async fn execute(
    db: &Surreal<Any>,
    query: &str,
    params: QueryParams,
) -> EngineResult<Vec<Record>> {
    let response = db
        .query(query)
        .bind(params)
        .await
        .map_err(classify)?;
    let mut response = response.check().map_err(classify)?;
    let last = response.num_statements().saturating_sub(1);
    let value: surrealdb::Value = response
        .take(last)
        .map_err(|err| EngineError::Serialization(err.to_string()))?;
    Ok(into_records(value.into_inner().into_json()))
}

/// Array results become rows; `NONE` becomes no rows; any other value is a
/// single row. Record ids are rendered as `table:id` strings.
fn into_records(value: Value) -> Vec<Record> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

impl QueryEngine for SurrealEngine {
    async fn verify_connectivity(&self) -> EngineResult<()> {
        self.shared
            .health()
            .await
            .map_err(|err| EngineError::Connection(err.to_string()))
    }

    async fn execute_read_query(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
    ) -> EngineResult<Vec<Record>> {
        self.run(auth, query, params).await
    }

    async fn execute_write_query(
        &self,
        auth: &AuthContext,
        query: &str,
        params: QueryParams,
    ) -> EngineResult<Vec<Record>> {
        self.run(auth, query, params).await
    }
}

async fn open(endpoint: &str) -> EngineResult<Surreal<Any>> {
    any::connect(endpoint)
        .await
        .map_err(|err| EngineError::Connection(err.to_string()))
}

async fn select(db: &Surreal<Any>, settings: &SurrealSettings) -> EngineResult<()> {
    db.use_ns(&settings.namespace)
        .use_db(&settings.database)
        .await
        .map_err(|err| EngineError::Connection(err.to_string()))
}

#[allow(clippy::needless_pass_by_value)]
fn auth_error(err: surrealdb::Error) -> EngineError {
    EngineError::Auth(err.to_string())
}

/// Statement errors reported by the engine are query errors. Embedded engines
/// report them as `Db` errors and remote engines as `Api::Query`.
fn classify(err: surrealdb::Error) -> EngineError {
    match err {
        surrealdb::Error::Db(err) => EngineError::Query(err.to_string()),
        surrealdb::Error::Api(surrealdb::error::Api::Query(message)) => {
            EngineError::Query(message)
        }
        other => EngineError::Connection(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn results_convert_to_rows() {
        assert_eq!(into_records(json!([{"a": 1}, {"a": 2}])).len(), 2);
        assert_eq!(into_records(Value::Null), Vec::<Record>::new());
        assert_eq!(into_records(json!("1.4.0")), vec![json!("1.4.0")]);
    }
}
