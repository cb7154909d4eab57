use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::state::AppState;
use crate::utils::error::ApiError;

const MSG_LOGIN_REQUIRED: &str = "Silakan login terlebih dahulu.";

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer token to a `Principal` and attach it to the request.
/// Tokens of users no longer in the directory are rejected.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized(MSG_LOGIN_REQUIRED.to_string()))?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized(MSG_LOGIN_REQUIRED.to_string())
    })?;

    let principal = state
        .directory
        .lookup(&claims.sub)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| {
            warn!("Token for unknown user '{}'", claims.sub);
            ApiError::Unauthorized(MSG_LOGIN_REQUIRED.to_string())
        })?;

    debug!(user = %principal.username, role = principal.role.as_str(), "Authenticated request");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
