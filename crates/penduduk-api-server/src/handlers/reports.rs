use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::models::Principal;
use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::files::Output;
use crate::utils::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct NikRequest {
    #[serde(default)]
    pub nik: String,
}

/// GET /api/cetak: hamlets available in the print menu
pub async fn print_menu(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let hamlets = state.reports.printable_hamlets(&principal).await?;
    Ok(Json(ApiResponse::success(hamlets)))
}

/// GET /api/cetak/kk/{nomor_kk}
pub async fn family_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(nomor_kk): Path<String>,
) -> Result<Output, ApiError> {
    Ok(state.reports.family_card(&principal, &nomor_kk).await?)
}

/// POST /api/cetak/kk/dari-nik
pub async fn family_card_by_nik(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<NikRequest>,
) -> Result<Output, ApiError> {
    let nomor_kk = state.residents.household_of(&principal, &body.nik).await?;
    Ok(state.reports.family_card(&principal, &nomor_kk).await?)
}

/// GET /api/cetak/kk/semua
pub async fn all_family_cards(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Output, ApiError> {
    Ok(state.reports.all_family_cards(&principal).await?)
}

/// GET /api/cetak/kk/dusun/{dusun}
pub async fn hamlet_family_cards(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(dusun): Path<String>,
) -> Result<Output, ApiError> {
    Ok(state.reports.hamlet_family_cards(&principal, &dusun).await?)
}

/// GET /api/cetak/daftar/semua
pub async fn roster(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Output, ApiError> {
    Ok(state.reports.roster(&principal).await?)
}

/// GET /api/cetak/daftar/dusun/{dusun}
pub async fn hamlet_roster(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(dusun): Path<String>,
) -> Result<Output, ApiError> {
    Ok(state.reports.hamlet_roster(&principal, &dusun).await?)
}

/// GET /api/cetak/statistik
pub async fn statistics(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Output, ApiError> {
    Ok(state.reports.statistics(&principal).await?)
}
