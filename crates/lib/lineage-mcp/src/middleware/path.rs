use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// The only path served over HTTP.
pub const MCP_PATH: &str = "/mcp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("This server only handles requests to /mcp")]
    UnknownPath,
}

impl IntoResponse for PathError {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, format!("Not Found: {self}")).into_response()
    }
}

/// Rejects every request whose path is not exactly [`MCP_PATH`].
pub async fn validate_path(request: Request, next: Next) -> Response {
    if request.uri().path() != MCP_PATH {
        return PathError::UnknownPath.into_response();
    }
    next.run(request).await
}
