//! Startup capability probe.
//!
//! Runs once before the server accepts connections. Connectivity and read
//! path failures abort startup; the optional analytics module is reported as
//! installed, absent, or undetermined.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use lineage_store::queries::{PROBE_EXTENSION, PROBE_READ, PROBE_SCHEMA_HELPER};
use lineage_store::schema::SCHEMA_HELPER_FUNCTION;

use crate::auth::AuthContext;
use crate::engine::{EngineError, QueryEngine, QueryParams, Record};

/// Availability of the lineage analytics module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureAvailability {
    Installed { version: String },
    /// The engine rejected the probe statement.
    Absent,
    /// The probe failed for another reason, e.g. a dropped connection.
    Undetermined { reason: String },
}

/// Capabilities detected at startup. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCapabilities {
    pub optional_feature: FeatureAvailability,
    /// Lets the schema tool ask `fn::schema_summary` before sampling tables.
    pub schema_helper_available: bool,
}

impl ServerCapabilities {
    /// Capabilities with the analytics module either installed or absent.
    #[must_use]
    pub fn with_optional_feature(installed: bool) -> Self {
        let optional_feature = if installed {
            FeatureAvailability::Installed {
                version: "unknown".to_string(),
            }
        } else {
            FeatureAvailability::Absent
        };
        Self {
            optional_feature,
            schema_helper_available: false,
        }
    }

    /// Only a confirmed installation enables optional tools.
    #[must_use]
    pub const fn optional_feature_installed(&self) -> bool {
        matches!(self.optional_feature, FeatureAvailability::Installed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to verify query engine connectivity: {0}")]
    ConnectivityFailure(#[source] EngineError),
    #[error("read query check failed: {0}")]
    ReadCheckFailure(#[source] EngineError),
    #[error("lineage analytics module is not installed: {0}")]
    FeatureAbsent(#[source] EngineError),
    #[error("could not determine lineage analytics module availability: {0}")]
    FeatureUndetermined(#[source] EngineError),
}

impl ProbeError {
    /// Fatal errors must stop the server from starting.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectivityFailure(_) | Self::ReadCheckFailure(_))
    }
}

/// Runs the probe sequence against the engine.
///
/// Probes use the server's own identity.
///
/// # Errors
/// Returns `ProbeError::ConnectivityFailure` or `ProbeError::ReadCheckFailure`
/// when the engine cannot serve reads. Optional probes never fail the call.
pub async fn probe_capabilities<E: QueryEngine>(
    engine: &E,
) -> Result<ServerCapabilities, ProbeError> {
    engine
        .verify_connectivity()
        .await
        .map_err(ProbeError::ConnectivityFailure)?;
    debug!("query engine connectivity verified");

    engine
        .execute_read_query(&AuthContext::None, PROBE_READ, QueryParams::new())
        .await
        .map_err(ProbeError::ReadCheckFailure)?;
    debug!("query engine read path verified");

    let schema_helper_available = probe_schema_helper(engine).await;
    if schema_helper_available {
        info!("schema summary helper is available");
    } else {
        info!("schema summary helper not found; schema tool will sample records");
    }

    let optional_feature = match probe_extension(engine).await {
        Ok(version) => {
            info!(%version, "lineage analytics module installed");
            FeatureAvailability::Installed { version }
        }
        Err(err @ ProbeError::FeatureAbsent(_)) => {
            info!(error = %err, "lineage analytics module absent; optional tools disabled");
            FeatureAvailability::Absent
        }
        Err(err) => {
            warn!(
                error = %err,
                "lineage analytics module availability undetermined; optional tools disabled"
            );
            FeatureAvailability::Undetermined {
                reason: err.to_string(),
            }
        }
    };

    Ok(ServerCapabilities {
        optional_feature,
        schema_helper_available,
    })
}

async fn probe_schema_helper<E: QueryEngine>(engine: &E) -> bool {
    match engine
        .execute_read_query(&AuthContext::None, PROBE_SCHEMA_HELPER, QueryParams::new())
        .await
    {
        Ok(records) => records.first().is_some_and(defines_schema_helper),
        Err(err) => {
            debug!(error = %err, "schema helper probe failed");
            false
        }
    }
}

fn defines_schema_helper(info: &Record) -> bool {
    let qualified = format!("fn::{SCHEMA_HELPER_FUNCTION}");
    info.get("functions")
        .and_then(Value::as_object)
        .is_some_and(|functions| {
            functions.contains_key(SCHEMA_HELPER_FUNCTION) || functions.contains_key(&qualified)
        })
}

async fn probe_extension<E: QueryEngine>(engine: &E) -> Result<String, ProbeError> {
    let records = engine
        .execute_read_query(&AuthContext::None, PROBE_EXTENSION, QueryParams::new())
        .await
        .map_err(|err| {
            if err.is_query_error() {
                ProbeError::FeatureAbsent(err)
            } else {
                ProbeError::FeatureUndetermined(err)
            }
        })?;
    let version = match records.first() {
        Some(Value::String(version)) => version.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    };
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::ScriptedEngine;
    use serde_json::json;

    #[tokio::test]
    async fn connectivity_failure_is_fatal() {
        let engine = ScriptedEngine::new().with_connectivity_failure("connection refused");

        let err = probe_capabilities(&engine)
            .await
            .expect_err("probe should fail");

        assert!(matches!(err, ProbeError::ConnectivityFailure(_)));
        assert!(err.is_fatal());
        assert!(engine.calls().is_empty(), "no statements after a failed handshake");
    }

    #[tokio::test]
    async fn read_check_failure_is_fatal() {
        let engine = ScriptedEngine::new().with_query_error(PROBE_READ, "permission denied");

        let err = probe_capabilities(&engine)
            .await
            .expect_err("probe should fail");

        assert!(matches!(err, ProbeError::ReadCheckFailure(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn extension_query_error_means_absent() {
        let engine = ScriptedEngine::new()
            .with_query_error(PROBE_EXTENSION, "The function 'fn::lineage_version' does not exist");

        let capabilities = probe_capabilities(&engine).await.expect("probe succeeds");

        assert_eq!(capabilities.optional_feature, FeatureAvailability::Absent);
        assert!(!capabilities.optional_feature_installed());
    }

    #[tokio::test]
    async fn extension_connection_error_is_undetermined() {
        let engine =
            ScriptedEngine::new().with_connection_error(PROBE_EXTENSION, "connection reset");

        let capabilities = probe_capabilities(&engine).await.expect("probe succeeds");

        assert!(matches!(
            capabilities.optional_feature,
            FeatureAvailability::Undetermined { .. }
        ));
        assert!(!capabilities.optional_feature_installed());
    }

    #[tokio::test]
    async fn installed_extension_reports_version() {
        let engine = ScriptedEngine::new()
            .with_rows(PROBE_EXTENSION, vec![json!("2.1.0")])
            .with_rows(
                PROBE_SCHEMA_HELPER,
                vec![json!({"functions": {"schema_summary": "DEFINE FUNCTION ..."}})],
            );

        let capabilities = probe_capabilities(&engine).await.expect("probe succeeds");

        assert_eq!(
            capabilities.optional_feature,
            FeatureAvailability::Installed {
                version: "2.1.0".to_string()
            }
        );
        assert!(capabilities.optional_feature_installed());
        assert!(capabilities.schema_helper_available);
    }

    #[tokio::test]
    async fn probes_run_in_order_with_server_identity() {
        let engine = ScriptedEngine::new();

        let _ = probe_capabilities(&engine).await.expect("probe succeeds");

        let calls = engine.calls();
        let queries: Vec<&str> = calls.iter().map(|call| call.query.as_str()).collect();
        assert_eq!(queries, vec![PROBE_READ, PROBE_SCHEMA_HELPER, PROBE_EXTENSION]);
        assert!(calls.iter().all(|call| call.auth == AuthContext::None && !call.write));
    }

    #[tokio::test]
    async fn schema_helper_probe_failure_is_informational() {
        let engine = ScriptedEngine::new()
            .with_query_error(PROBE_SCHEMA_HELPER, "not allowed")
            .with_rows(PROBE_EXTENSION, vec![json!("1.0.0")]);

        let capabilities = probe_capabilities(&engine).await.expect("probe succeeds");

        assert!(!capabilities.schema_helper_available);
        assert!(capabilities.optional_feature_installed());
    }
}
