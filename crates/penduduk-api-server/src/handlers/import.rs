use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::info;

use crate::models::Principal;
use crate::services::import_service::MSG_IMPORTED;
use crate::services::{ImportError, ImportSummary, ServiceError};
use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::files::sanitize_filename;
use crate::utils::response::ApiResponse;

/// POST /api/penduduk/import, multipart field `file`
pub async fn upload(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
            .to_vec();
        upload = Some((file_name, bytes));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::from(ServiceError::from(ImportError::NoFile)))?;
    info!(user = %principal.username, file = %file_name, size = bytes.len(), "Import upload received");

    let summary = state.importer.import(&principal, &file_name, &bytes).await?;
    Ok(Json(ApiResponse::success_with_message(summary, MSG_IMPORTED)))
}

/// GET /api/template/{filename}
pub async fn download_template(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let safe = sanitize_filename(&filename);
    let path = state.settings.storage.template_dir.join(&safe);
    if !path.is_file() {
        return Err(ApiError::NotFound("Template tidak ditemukan.".to_string()));
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.essence_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
