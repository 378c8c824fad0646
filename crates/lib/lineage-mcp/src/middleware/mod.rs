//! HTTP request gate in front of the MCP service.
//!
//! Layers run in this order: path validation, CORS, authentication, logging,
//! then dispatch. Path and authentication failures never reach the service.

mod auth;
mod cors;
mod logging;
mod path;

use std::sync::Arc;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use lineage_core::config::RuntimeConfig;

pub use auth::{AuthPolicy, AuthRejection, authenticate_request};
pub use cors::{CorsPolicy, apply_cors};
pub use logging::log_request;
pub use path::{MCP_PATH, PathError, validate_path};

/// Wraps `router` with the request gate configured from `runtime`.
#[must_use]
pub fn guard(router: Router, runtime: &RuntimeConfig) -> Router {
    let auth = Arc::new(AuthPolicy {
        api_token: runtime.api_token.clone(),
    });
    let cors = Arc::new(CorsPolicy::new(&runtime.allowed_origins));

    // Last added runs first.
    router
        .layer(from_fn(log_request))
        .layer(from_fn_with_state(auth, authenticate_request))
        .layer(from_fn_with_state(cors, apply_cors))
        .layer(from_fn(validate_path))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::extract::Request;
    use axum::http::header::{
        ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_MAX_AGE,
        WWW_AUTHENTICATE,
    };
    use axum::http::{HeaderMap, Method, StatusCode};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use lineage_core::auth::AuthContext;
    use tower::ServiceExt;

    use super::*;

    async fn echo_auth(request: Request) -> String {
        request
            .extensions()
            .get::<AuthContext>()
            .map_or("missing", AuthContext::mode)
            .to_string()
    }

    fn app(runtime: &RuntimeConfig) -> Router {
        guard(Router::new().fallback(echo_auth), runtime)
    }

    fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).expect("valid test request")
    }

    async fn send(router: Router, request: Request) -> (StatusCode, HeaderMap, String) {
        let response = router.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = String::from_utf8(body.to_vec()).expect("utf-8 body");
        (status, headers, body)
    }

    fn challenges(headers: &HeaderMap) -> Vec<&str> {
        headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(user_pass))
    }

    #[tokio::test]
    async fn off_path_requests_are_not_found_before_auth() {
        let runtime = RuntimeConfig::default()
            .with_api_token("T")
            .with_allowed_origins(["*"]);
        for uri in ["/", "/mcp/", "/health", "/mcpx"] {
            let (status, headers, body) =
                send(app(&runtime), request(Method::POST, uri, &[])).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body, "Not Found: This server only handles requests to /mcp");
            assert!(challenges(&headers).is_empty(), "{uri}");
            assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none(), "{uri}");
        }
    }

    #[tokio::test]
    async fn missing_credentials_challenge_both_schemes() {
        let (status, headers, body) =
            send(app(&RuntimeConfig::default()), request(Method::POST, "/mcp", &[])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            challenges(&headers),
            [
                "Basic realm=\"MicroStrategy Lineage MCP\"",
                "Bearer realm=\"MicroStrategy Lineage MCP\"",
            ]
        );
        assert_eq!(body, "Unauthorized: Basic or Bearer authentication required");
    }

    #[tokio::test]
    async fn basic_credentials_reach_the_service() {
        let header = basic("analyst:secret");
        let (status, _, body) = send(
            app(&RuntimeConfig::default()),
            request(Method::POST, "/mcp", &[("authorization", header.as_str())]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "basic");
    }

    #[tokio::test]
    async fn empty_basic_fields_challenge_basic() {
        let header = basic(":secret");
        let (status, headers, body) = send(
            app(&RuntimeConfig::default()),
            request(Method::POST, "/mcp", &[("authorization", header.as_str())]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(challenges(&headers), ["Basic realm=\"MicroStrategy Lineage MCP\""]);
        assert_eq!(body, "Unauthorized: Username and password cannot be empty");
    }

    #[tokio::test]
    async fn bearer_passthrough_without_api_token() {
        let (status, _, body) = send(
            app(&RuntimeConfig::default()),
            request(Method::POST, "/mcp", &[("authorization", "Bearer sso-token")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bearer");
    }

    #[tokio::test]
    async fn api_token_mode() {
        let runtime = RuntimeConfig::default().with_api_token("T");

        let (status, _, body) = send(
            app(&runtime),
            request(Method::POST, "/mcp", &[("authorization", "Bearer T")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "api_token");

        let (status, headers, body) = send(
            app(&runtime),
            request(Method::POST, "/mcp", &[("authorization", "Bearer T2")]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(challenges(&headers), ["Bearer realm=\"MicroStrategy Lineage MCP\""]);
        assert_eq!(body, "Unauthorized: Invalid API token");

        let header = basic("analyst:secret");
        let (status, _, body) = send(
            app(&runtime),
            request(Method::POST, "/mcp", &[("authorization", header.as_str())]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized: Bearer token required");
    }

    #[tokio::test]
    async fn empty_bearer_is_rejected() {
        for runtime in [
            RuntimeConfig::default(),
            RuntimeConfig::default().with_api_token("T"),
        ] {
            let (status, _, body) = send(
                app(&runtime),
                request(Method::POST, "/mcp", &[("authorization", "Bearer ")]),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "Unauthorized: Bearer token is empty");
        }
    }

    #[tokio::test]
    async fn no_cors_headers_without_allowed_origins() {
        let runtime = RuntimeConfig::default();
        let (status, headers, _) = send(
            app(&runtime),
            request(
                Method::POST,
                "/mcp",
                &[
                    ("origin", "https://a.example"),
                    ("authorization", "Bearer sso"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).is_none());

        let (status, _, _) = send(
            app(&runtime),
            request(Method::OPTIONS, "/mcp", &[("origin", "https://a.example")]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wildcard_allows_every_origin() {
        let runtime = RuntimeConfig::default().with_allowed_origins(["*"]);
        let (status, headers, _) = send(
            app(&runtime),
            request(
                Method::POST,
                "/mcp",
                &[
                    ("origin", "https://unknown.example"),
                    ("authorization", "Bearer sso"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[tokio::test]
    async fn preflight_skips_authentication() {
        let runtime = RuntimeConfig::default()
            .with_api_token("T")
            .with_allowed_origins(["https://a.example"]);
        let (status, headers, body) = send(
            app(&runtime),
            request(Method::OPTIONS, "/mcp", &[("origin", "https://a.example")]),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.example");
        assert!(challenges(&headers).is_empty());
    }

    #[tokio::test]
    async fn unmatched_origins_get_no_allow_origin() {
        let runtime = RuntimeConfig::default().with_allowed_origins(["https://a.example"]);
        let (status, headers, _) = send(
            app(&runtime),
            request(
                Method::POST,
                "/mcp",
                &[
                    ("origin", "https://b.example"),
                    ("authorization", "Bearer sso"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn rejections_still_carry_cors_headers() {
        let runtime = RuntimeConfig::default().with_allowed_origins(["https://a.example"]);
        let (status, headers, _) = send(
            app(&runtime),
            request(Method::POST, "/mcp", &[("origin", "https://a.example")]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.example");
    }
}
