//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{TimeZone, Utc};
use editlock_api::error::AppError;
use editlock_core::error::{ConflictKind, CoreError, LockConflict, StoreError};
use editlock_core::target::LockTarget;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn conflict(kind: ConflictKind) -> LockConflict {
    LockConflict {
        kind,
        target: LockTarget::new("article", 7).unwrap(),
        holder: 3,
        holder_name: Some("Alice".into()),
        expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 10, 0).unwrap(),
        seconds_remaining: 300,
    }
}

// ---------------------------------------------------------------------------
// Lock errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lock_conflict_returns_423() {
    let err = AppError::Core(CoreError::LockConflict(conflict(ConflictKind::Acquire)));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(json["code"], "LOCKED");
    assert_eq!(
        json["error"],
        "article 7 is locked by user Alice until 2026-03-01T09:10:00+00:00"
    );
}

#[tokio::test]
async fn write_conflict_uses_save_message() {
    let err = AppError::Core(CoreError::LockConflict(conflict(ConflictKind::Write)));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(
        json["error"],
        "You cannot save this object because it is locked by user Alice for roughly 5 more minutes."
    );
}

#[tokio::test]
async fn target_not_found_returns_404() {
    let err = AppError::Core(CoreError::TargetNotFound(
        LockTarget::new("article", 99).unwrap(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "article 99 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("entity_id must be positive".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "entity_id must be positive");
}

// ---------------------------------------------------------------------------
// Auth errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn forbidden_error_returns_403() {
    let err = AppError::Core(CoreError::Forbidden("Admin role required".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["error"], "Admin role required");
}

// ---------------------------------------------------------------------------
// Sanitized errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_error_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Store(StoreError::new(
        "connection refused at 10.0.0.5:5432",
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid field value");
}
