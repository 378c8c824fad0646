use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderMap, HeaderName};
use axum::http::header::{CONTENT_LENGTH, HOST, USER_AGENT};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

fn header<'a>(headers: &'a HeaderMap, name: HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Emits one debug event per request. Never alters the request.
pub async fn log_request(request: Request, next: Next) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let headers = request.headers();
    debug!(
        method = %request.method(),
        path = request.uri().path(),
        remote_addr = %remote_addr,
        user_agent = header(headers, USER_AGENT),
        content_length = header(headers, CONTENT_LENGTH),
        host = header(headers, HOST),
        query = request.uri().query().unwrap_or(""),
        "http request"
    );
    next.run(request).await
}
