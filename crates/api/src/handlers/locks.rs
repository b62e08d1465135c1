//! Handlers for record locks: acquire, release, status, save check and the
//! caller's own lock listing.
//!
//! Targets are addressed by path (`/{entity_type}/{entity_id}`) and validated
//! before the engine is consulted, so malformed input is a 400 and a
//! well-formed reference to a missing record is a 404.

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::Json;
use editlock_core::config::ClientLockSettings;
use editlock_core::engine::{LockStatus, ReleaseOutcome};
use editlock_core::error::CoreError;
use editlock_core::record::LockMode;
use editlock_core::target::LockTarget;
use editlock_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::ensure_may_override;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `POST /lock/{entity_type}/{entity_id}`.
#[derive(Debug, Deserialize)]
pub struct AcquireParams {
    /// Hard locks are also enforced by the save check (default `true`).
    #[serde(default = "default_hard")]
    pub hard: bool,
    /// Take the lock even if another user holds it (admins only).
    #[serde(default, rename = "override")]
    pub override_lock: bool,
}

fn default_hard() -> bool {
    true
}

/// Query parameters for `POST /unlock/{entity_type}/{entity_id}`.
#[derive(Debug, Deserialize)]
pub struct ReleaseParams {
    #[serde(default, rename = "override")]
    pub override_lock: bool,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    #[serde(flatten)]
    pub target: LockTarget,
    pub released: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveCheckResponse {
    #[serde(flatten)]
    pub target: LockTarget,
    pub can_save: bool,
}

/// A validated `/{entity_type}/{entity_id}` path.
///
/// A non-numeric id is a `BAD_REQUEST`, a malformed type or non-positive id
/// a `VALIDATION_ERROR`; both use the JSON error body.
pub struct TargetPath(pub LockTarget);

impl<S: Send + Sync> FromRequestParts<S> for TargetPath {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((entity_type, entity_id)) =
            Path::<(String, DbId)>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(TargetPath(LockTarget::new(entity_type, entity_id)?))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/lock/{entity_type}/{entity_id}
///
/// Acquire or renew the caller's lock. Returns 423 if another user holds an
/// active lock and `override` was not given.
pub async fn acquire_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    TargetPath(target): TargetPath,
    Query(params): Query<AcquireParams>,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    ensure_may_override(&auth, params.override_lock)?;

    let record = state
        .engine
        .acquire(
            &target,
            &auth.lock_user(),
            LockMode::from_hard_flag(params.hard),
            params.override_lock,
        )
        .await?;

    Ok(Json(DataResponse {
        data: state.engine.describe(&record, auth.user_id),
    }))
}

/// POST /api/v1/unlock/{entity_type}/{entity_id}
///
/// Release the caller's lock. Always succeeds for the caller: unlocking
/// something they do not hold changes nothing and reports `released: false`.
pub async fn release_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    TargetPath(target): TargetPath,
    Query(params): Query<ReleaseParams>,
) -> AppResult<Json<DataResponse<ReleaseResponse>>> {
    ensure_may_override(&auth, params.override_lock)?;

    let outcome = match state
        .engine
        .release(&target, auth.user_id, params.override_lock)
        .await
    {
        Ok(outcome) => outcome,
        Err(CoreError::LockConflict(conflict)) => {
            tracing::debug!(
                user_id = auth.user_id,
                holder = conflict.holder,
                entity_type = %target.entity_type,
                entity_id = target.entity_id,
                "Ignoring unlock of a lock held by another user"
            );
            ReleaseOutcome::NotLocked
        }
        Err(other) => return Err(AppError::Core(other)),
    };

    Ok(Json(DataResponse {
        data: ReleaseResponse {
            target,
            released: outcome.released(),
        },
    }))
}

/// GET /api/v1/lock_status/{entity_type}/{entity_id}
pub async fn get_lock_status(
    auth: AuthUser,
    State(state): State<AppState>,
    TargetPath(target): TargetPath,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    let status = state.engine.status(&target, auth.user_id).await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/lock/{entity_type}/{entity_id}/save_check
///
/// Write-path hook for editors: 423 when a hard lock held by someone else
/// is active, otherwise `can_save: true`.
pub async fn save_check(
    auth: AuthUser,
    State(state): State<AppState>,
    TargetPath(target): TargetPath,
) -> AppResult<Json<DataResponse<SaveCheckResponse>>> {
    state.engine.check_write(&target, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: SaveCheckResponse {
            target,
            can_save: true,
        },
    }))
}

/// GET /api/v1/locks/mine
pub async fn list_my_locks(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<LockStatus>>>> {
    let records = state.engine.active_locks_for(auth.user_id).await?;
    let data = records
        .iter()
        .map(|record| state.engine.describe(record, auth.user_id))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/locks/config
///
/// Timing settings the editing UI needs to warn before a lock lapses.
pub async fn get_lock_config(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Json<DataResponse<ClientLockSettings>> {
    Json(DataResponse {
        data: state.engine.config().client_settings(),
    })
}
