use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::models::{ActivityLogEntry, DeletionLogEntry, Principal};
use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::response::ApiResponse;

/// GET /api/riwayat-hapus
pub async fn deletion_history(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<DeletionLogEntry>>>, ApiError> {
    let entries = state.residents.deletion_history(&principal).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// POST /api/riwayat-hapus/{nik}/restore
pub async fn restore(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(nik): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let message = state.residents.restore(&principal, &nik).await?;
    Ok(Json(ApiResponse::message(message)))
}

/// GET /api/log-aktivitas
pub async fn activity_log(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<ActivityLogEntry>>>, ApiError> {
    let entries = state.residents.recent_activity(&principal).await?;
    Ok(Json(ApiResponse::success(entries)))
}
