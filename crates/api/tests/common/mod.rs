#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use editlock_api::auth::jwt::{generate_access_token, JwtConfig};
use editlock_api::config::{ServerConfig, SweepConfig};
use editlock_api::router::build_app_router;
use editlock_api::state::AppState;
use editlock_core::clock::ManualClock;
use editlock_core::config::LockingConfig;
use editlock_core::engine::LockEngine;
use editlock_core::memory::{InMemoryLockStore, InMemoryTargets};
use editlock_core::roles::{ROLE_ADMIN, ROLE_EDITOR};
use editlock_core::target::LockTarget;
use editlock_core::types::DbId;
use http_body_util::BodyExt;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "test-secret-not-for-production";

/// Build a test `ServerConfig` with safe defaults and 600s/540s lock timing.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        locking: LockingConfig::default(),
        sweep: SweepConfig::default(),
        lockable_entities: String::new(),
    }
}

/// A router over in-memory state, plus handles for steering it.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryLockStore>,
}

impl TestApp {
    /// A fresh handle to the router; `oneshot` consumes it.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers.
///
/// Articles 1 through 5 exist; every other target is missing. The clock
/// starts at a fixed instant and only moves when a test advances it.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    ));
    let store = Arc::new(InMemoryLockStore::new());
    let targets =
        InMemoryTargets::known((1..=5).map(|id| LockTarget::new("article", id).unwrap()));

    let engine = Arc::new(LockEngine::new(
        config.locking,
        store.clone(),
        Arc::new(targets),
        clock.clone(),
    ));
    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };
    let router = build_app_router(state, &config).unwrap();

    TestApp {
        router,
        clock,
        store,
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn token_for(user_id: DbId, role: &str, name: Option<&str>) -> String {
    generate_access_token(user_id, role, name, &test_config().jwt).unwrap()
}

pub fn editor(user_id: DbId, name: &str) -> String {
    token_for(user_id, ROLE_EDITOR, Some(name))
}

pub fn admin(user_id: DbId) -> String {
    token_for(user_id, ROLE_ADMIN, Some("Admin"))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token)).await
}

pub async fn post(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
