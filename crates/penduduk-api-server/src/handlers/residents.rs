use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::models::{ListParams, ListQuery, Principal, Resident, ResidentForm, ResidentPage, WriteOutcome};
use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::files::Output;
use crate::utils::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub alasan: String,
}

/// GET /api/penduduk?search=&limit=&page=&view=
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<ResidentPage>>, ApiError> {
    let query = ListQuery::from(&params);
    let page = state.residents.list(&principal, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/penduduk/{nik}
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(nik): Path<String>,
) -> Result<Json<ApiResponse<Resident>>, ApiError> {
    let resident = state.residents.get(&principal, &nik).await?;
    Ok(Json(ApiResponse::success(resident)))
}

/// POST /api/penduduk
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(form): Json<ResidentForm>,
) -> Result<(StatusCode, Json<ApiResponse<WriteOutcome>>), ApiError> {
    let outcome = state.residents.create(&principal, &form).await?;
    let warnings = outcome.warnings.clone();
    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success_with_message(outcome, "Data berhasil ditambahkan!")
                .with_warnings(warnings),
        ),
    ))
}

/// PUT /api/penduduk/{nik}
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(nik): Path<String>,
    Json(form): Json<ResidentForm>,
) -> Result<Json<ApiResponse<WriteOutcome>>, ApiError> {
    let outcome = state.residents.update(&principal, &nik, &form).await?;
    let warnings = outcome.warnings.clone();
    Ok(Json(
        ApiResponse::success_with_message(outcome, "Data berhasil diubah!").with_warnings(warnings),
    ))
}

/// DELETE /api/penduduk/{nik} with `{"alasan": "..."}`
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(nik): Path<String>,
    Json(body): Json<DeleteRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let message = state.residents.delete(&principal, &nik, &body.alasan).await?;
    Ok(Json(ApiResponse::message(message)))
}

/// GET /api/penduduk/export
pub async fn export(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Output, ApiError> {
    Ok(state.exporter.export(&principal).await?)
}
