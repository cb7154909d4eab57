use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ensure, ServiceError, ServiceResult};
use super::validation::{is_sixteen_digits, ValidationError, MSG_HAMLET, MSG_NIK};
use crate::auth::{JwtManager, PasswordService, UserDirectory};
use crate::database::Repository;
use crate::logging::{ActivityAction, ActivityLog, ActivityLogger};
use crate::models::{
    Hamlet, LoginRequest, LoginResponse, NewUserForm, Principal, UserSummary, ROLE_ADMIN,
    ROLE_HAMLET_HEAD, ROLE_RESIDENT,
};
use crate::security::authorization::require_admin;

pub const MSG_LOGIN_FAILED: &str = "Login gagal! Username atau password salah.";
pub const MSG_USERNAME_TAKEN: &str = "Username sudah ada.";
pub const MSG_USER_CREATED: &str = "User berhasil ditambahkan!";

const BOOTSTRAP_USERNAME: &str = "admin";

pub struct AuthService {
    repository: Arc<Repository>,
    directory: Arc<UserDirectory>,
    jwt: Arc<JwtManager>,
    activity: ActivityLogger,
}

impl AuthService {
    pub fn new(
        repository: Arc<Repository>,
        directory: Arc<UserDirectory>,
        jwt: Arc<JwtManager>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            repository,
            directory,
            jwt,
            activity,
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> ServiceResult<LoginResponse> {
        let failed = || ServiceError::Unauthorized(MSG_LOGIN_FAILED.to_string());

        let row = self
            .repository
            .find_user(request.username.trim())
            .await?
            .ok_or_else(failed)?;

        let verified = PasswordService::verify(&request.password, &row.password_hash)
            .unwrap_or_else(|e| {
                warn!("Stored hash for '{}' is unusable: {}", row.username, e);
                false
            });
        if !verified {
            return Err(failed());
        }

        let principal = row.principal().map_err(|e| {
            warn!("User '{}' has an inconsistent role: {}", row.username, e);
            failed()
        })?;
        let token = self
            .jwt
            .generate_token(&principal.username, principal.role.as_str())
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        info!(user = %principal.username, role = principal.role.as_str(), "Login succeeded");
        Ok(LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: self.jwt.expiration_seconds(),
            user: principal,
        })
    }

    pub async fn list_users(&self, principal: &Principal) -> ServiceResult<Vec<UserSummary>> {
        ensure(require_admin(principal))?;
        Ok(self.repository.list_user_summaries().await?)
    }

    /// Admin-only. Hamlet is kept only for hamlet heads, the linked NIK
    /// only for residents.
    pub async fn create_user(&self, principal: &Principal, form: &NewUserForm) -> ServiceResult<i64> {
        ensure(require_admin(principal))?;

        let username = form.username.trim();
        let role = form.role.trim();
        let mut errors = Vec::new();
        if username.is_empty() || form.password.is_empty() {
            errors.push("Username dan password wajib diisi.".to_string());
        }

        let (dusun, nik) = match role {
            ROLE_ADMIN => (None, None),
            ROLE_HAMLET_HEAD => match form.dusun.as_deref().map(str::parse::<Hamlet>) {
                Some(Ok(h)) => (Some(h.as_str().to_string()), None),
                _ => {
                    errors.push(MSG_HAMLET.to_string());
                    (None, None)
                }
            },
            ROLE_RESIDENT => {
                let nik = form.nik_masyarakat.as_deref().map(str::trim).unwrap_or("");
                if !is_sixteen_digits(nik) {
                    errors.push(MSG_NIK.to_string());
                }
                (None, Some(nik.to_string()))
            }
            _ => {
                errors.push("Role tidak dikenal.".to_string());
                (None, None)
            }
        };
        if !errors.is_empty() {
            return Err(ValidationError(errors).into());
        }

        if self.repository.find_user(username).await?.is_some() {
            return Err(ServiceError::Conflict(MSG_USERNAME_TAKEN.to_string()));
        }

        let hash = PasswordService::hash(&form.password)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let id = match self
            .repository
            .insert_user(username, &hash, role, dusun.as_deref(), nik.as_deref())
            .await
        {
            Ok(id) => id,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(ServiceError::Conflict(MSG_USERNAME_TAKEN.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        self.directory.reload().await?;
        self.activity.log(ActivityLog::new(
            &principal.username,
            ActivityAction::TambahUser,
            format!("Tambah user: {} ({})", username, role),
        ));
        info!(user = %principal.username, created = username, role, "User created");
        Ok(id)
    }

    /// Create `admin` when the user table is empty. Returns whether an
    /// account was created.
    pub async fn bootstrap_admin(&self, password: &str) -> ServiceResult<bool> {
        if self.repository.count_users().await? > 0 {
            return Ok(false);
        }
        let hash =
            PasswordService::hash(password).map_err(|e| ServiceError::Internal(e.to_string()))?;
        self.repository
            .insert_user(BOOTSTRAP_USERNAME, &hash, ROLE_ADMIN, None, None)
            .await?;
        self.directory.reload().await?;
        warn!("Created bootstrap '{}' account, change its password", BOOTSTRAP_USERNAME);
        Ok(true)
    }
}
