use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use lineage_core::auth::{AuthError, authenticate};
use tracing::debug;

/// Server-side settings read by the authentication layer.
#[derive(Clone, Default)]
pub struct AuthPolicy {
    pub api_token: Option<String>,
}

impl std::fmt::Debug for AuthPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPolicy")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// 401 response for a rejected request.
#[derive(Debug, Clone, Copy)]
pub struct AuthRejection(pub AuthError);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut response =
            (StatusCode::UNAUTHORIZED, format!("Unauthorized: {}", self.0)).into_response();
        for scheme in self.0.challenges() {
            if let Ok(value) = HeaderValue::from_str(&scheme.challenge()) {
                response.headers_mut().append(WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

/// Classifies the request credentials and attaches the resulting
/// `AuthContext` to the request extensions.
pub async fn authenticate_request(
    State(policy): State<Arc<AuthPolicy>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    match authenticate(header, policy.api_token.as_deref()) {
        Ok(auth) => {
            debug!(auth = auth.mode(), "request authenticated");
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Err(err) => {
            debug!(error = %err, "request rejected");
            AuthRejection(err).into_response()
        }
    }
}
