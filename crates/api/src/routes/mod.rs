pub mod admin;
pub mod health;
pub mod locks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /lock/{entity_type}/{entity_id}              acquire (POST)
/// /lock/{entity_type}/{entity_id}/save_check   write-path check (POST)
/// /unlock/{entity_type}/{entity_id}            release (POST)
/// /lock_status/{entity_type}/{entity_id}       status (GET)
/// /locks/mine                                  caller's active locks (GET)
/// /locks/config                                client timing settings (GET)
///
/// /admin/locks                                 all active locks (GET, admin)
/// /admin/locks/{entity_type}/{entity_id}       force clear (DELETE, admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(locks::router())
        .nest("/admin", admin::router())
}
