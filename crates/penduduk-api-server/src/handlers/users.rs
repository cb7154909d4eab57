use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;

use crate::models::{NewUserForm, Principal, UserSummary};
use crate::services::auth_service::MSG_USER_CREATED;
use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: i64,
    pub username: String,
}

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    let users = state.auth.list_users(&principal).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(form): Json<NewUserForm>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedUser>>), ApiError> {
    let id = state.auth.create_user(&principal, &form).await?;
    let created = CreatedUser {
        id,
        username: form.username.trim().to_string(),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(created, MSG_USER_CREATED)),
    ))
}
