//! Outcome logging for lock endpoints.
//!
//! Mounted with [`axum::middleware::from_fn`] on the lock routes only, inside
//! the global trace layer, so each lock request gets one line naming the
//! route and how it ended.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

pub async fn log_lock_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::warn!(%method, route, status = status.as_u16(), elapsed_ms, "Lock request failed");
    } else {
        tracing::debug!(%method, route, status = status.as_u16(), elapsed_ms, "Lock request handled");
    }
    response
}
