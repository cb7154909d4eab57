use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::models::Principal;
use crate::services::{DashboardView, ProgressView, StatisticsView};
use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::files::RenderedFile;
use crate::utils::response::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ProgressParams {
    pub dusun: Option<String>,
    /// `YYYY-MM-DD - YYYY-MM-DD`
    pub tanggal: Option<String>,
}

/// GET /api/statistik
pub async fn statistics(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<StatisticsView>>, ApiError> {
    let view = state.statistics.statistics(&principal).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<DashboardView>>, ApiError> {
    let view = state.statistics.dashboard(&principal).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /api/dashboard/chart/{name}
pub async fn dashboard_chart(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<RenderedFile, ApiError> {
    Ok(state.statistics.chart_image(&principal, &name).await?)
}

/// GET /api/progress?dusun=&tanggal=
pub async fn progress(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ProgressParams>,
) -> Result<Json<ApiResponse<ProgressView>>, ApiError> {
    let mut view = state
        .statistics
        .progress(&principal, params.dusun.as_deref(), params.tanggal.as_deref())
        .await?;
    let warnings = std::mem::take(&mut view.warnings);
    Ok(Json(ApiResponse::success(view).with_warnings(warnings)))
}
