use axum::{extract::State, Extension, Json};
use tracing::info;

use crate::models::{LoginRequest, LoginResponse, Principal};
use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::response::ApiResponse;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let response = state.auth.login(&payload).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// POST /api/auth/logout. Tokens are stateless; the client drops its copy.
pub async fn logout(Extension(principal): Extension<Principal>) -> Json<ApiResponse<()>> {
    info!(user = %principal.username, "Logout");
    Json(ApiResponse::message("Anda telah logout."))
}

/// GET /api/auth/me
pub async fn me(Extension(principal): Extension<Principal>) -> Json<ApiResponse<Principal>> {
    Json(ApiResponse::success(principal))
}
