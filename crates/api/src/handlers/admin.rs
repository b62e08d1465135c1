//! Administrator-only lock handlers.

use axum::extract::State;
use axum::Json;
use editlock_core::engine::LockStatus;
use editlock_core::target::LockTarget;
use serde::Serialize;

use super::locks::TargetPath;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ForceClearResponse {
    #[serde(flatten)]
    pub target: LockTarget,
    pub cleared: bool,
}

/// GET /api/v1/admin/locks
///
/// Every active lock, newest first, as seen by the administrator.
pub async fn list_active_locks(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<LockStatus>>>> {
    let records = state.engine.active_locks().await?;
    let data = records
        .iter()
        .map(|record| state.engine.describe(record, admin.user_id))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/admin/locks/{entity_type}/{entity_id}
///
/// Remove the lock record outright, whoever holds it.
pub async fn force_clear_lock(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    TargetPath(target): TargetPath,
) -> AppResult<Json<DataResponse<ForceClearResponse>>> {
    let cleared = state.engine.force_clear(&target).await?;

    tracing::info!(
        admin_id = admin.user_id,
        entity_type = %target.entity_type,
        entity_id = target.entity_id,
        cleared,
        "Admin cleared lock"
    );

    Ok(Json(DataResponse {
        data: ForceClearResponse { target, cleared },
    }))
}
