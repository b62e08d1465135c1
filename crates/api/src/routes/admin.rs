//! Administrative lock routes. Every handler requires [`RequireAdmin`].
//!
//! [`RequireAdmin`]: crate::middleware::rbac::RequireAdmin

use axum::middleware;
use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::admin;
use crate::middleware::request_log::log_lock_request;
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
///
/// ```text
/// GET    /locks                              -> list_active_locks
/// DELETE /locks/{entity_type}/{entity_id}    -> force_clear_lock
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/locks", get(admin::list_active_locks))
        .route(
            "/locks/{entity_type}/{entity_id}",
            delete(admin::force_clear_lock),
        )
        .route_layer(middleware::from_fn(log_lock_request))
}
