//! Route definitions for record locks.
//!
//! All endpoints require authentication via the `AuthUser` extractor and are
//! wrapped in the lock request logger.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::locks;
use crate::middleware::request_log::log_lock_request;
use crate::state::AppState;

/// Lock routes, merged at the `/api/v1` root.
///
/// ```text
/// POST /lock/{entity_type}/{entity_id}             -> acquire_lock
/// POST /lock/{entity_type}/{entity_id}/save_check  -> save_check
/// POST /unlock/{entity_type}/{entity_id}           -> release_lock
/// GET  /lock_status/{entity_type}/{entity_id}      -> get_lock_status
/// GET  /locks/mine                                 -> list_my_locks
/// GET  /locks/config                               -> get_lock_config
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lock/{entity_type}/{entity_id}", post(locks::acquire_lock))
        .route(
            "/lock/{entity_type}/{entity_id}/save_check",
            post(locks::save_check),
        )
        .route("/unlock/{entity_type}/{entity_id}", post(locks::release_lock))
        .route(
            "/lock_status/{entity_type}/{entity_id}",
            get(locks::get_lock_status),
        )
        .route("/locks/mine", get(locks::list_my_locks))
        .route("/locks/config", get(locks::get_lock_config))
        .route_layer(middleware::from_fn(log_lock_request))
}
