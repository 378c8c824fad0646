use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
    ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE_SECONDS: &str = "86400";

/// Origins allowed to call the server from a browser.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    any_origin: bool,
    origins: BTreeSet<String>,
}

impl CorsPolicy {
    #[must_use]
    pub fn new(allowed_origins: &BTreeSet<String>) -> Self {
        Self {
            any_origin: allowed_origins.contains("*"),
            origins: allowed_origins.clone(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.origins.is_empty()
    }

    /// Value for `Access-Control-Allow-Origin`, if the origin is allowed.
    fn allow_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        if self.any_origin {
            return Some(HeaderValue::from_static("*"));
        }
        origin
            .filter(|origin| self.origins.contains(*origin))
            .and_then(|origin| HeaderValue::from_str(origin).ok())
    }

    fn apply(&self, origin: Option<&str>, headers: &mut HeaderMap) {
        if let Some(value) = self.allow_origin(origin) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECONDS),
        );
    }
}

/// Adds CORS headers and answers preflight requests without authenticating.
///
/// Does nothing when no origins are configured.
pub async fn apply_cors(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    if !policy.is_enabled() {
        return next.run(request).await;
    }

    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    policy.apply(origin.as_deref(), response.headers_mut());
    response
}
