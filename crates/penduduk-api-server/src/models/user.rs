use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::resident::Hamlet;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_HAMLET_HEAD: &str = "kepala_dusun";
pub const ROLE_RESIDENT: &str = "masyarakat";

/// Role of an authenticated user with the data that scopes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Admin,
    KepalaDusun { dusun: Hamlet },
    Masyarakat { nik: String },
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::KepalaDusun { .. } => ROLE_HAMLET_HEAD,
            Self::Masyarakat { .. } => ROLE_RESIDENT,
        }
    }

    /// Build a role from the stored columns. A hamlet head needs a valid
    /// hamlet, a resident needs a linked NIK.
    pub fn from_columns(
        role: &str,
        dusun: Option<&str>,
        nik: Option<&str>,
    ) -> Result<Self, String> {
        match role {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_HAMLET_HEAD => {
                let dusun = dusun
                    .ok_or_else(|| "kepala_dusun without dusun".to_string())?
                    .parse::<Hamlet>()
                    .map_err(|e| e.to_string())?;
                Ok(Self::KepalaDusun { dusun })
            }
            ROLE_RESIDENT => {
                let nik = nik
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| "masyarakat without nik".to_string())?;
                Ok(Self::Masyarakat {
                    nik: nik.to_string(),
                })
            }
            other => Err(format!("unknown role '{}'", other)),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// The caller of a request, resolved from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    #[serde(flatten)]
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Stored user row (`"user"` table).
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub dusun: Option<String>,
    pub nik_masyarakat: Option<String>,
}

impl UserRow {
    pub fn principal(&self) -> Result<Principal, String> {
        let role = Role::from_columns(
            &self.role,
            self.dusun.as_deref(),
            self.nik_masyarakat.as_deref(),
        )?;
        Ok(Principal::new(self.username.clone(), role))
    }
}

/// Public projection of a user, no password material.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub dusun: Option<String>,
    pub nik_masyarakat: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUserForm {
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub dusun: Option<String>,
    #[serde(default)]
    pub nik_masyarakat: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: Principal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_columns() {
        assert_eq!(Role::from_columns("admin", None, None), Ok(Role::Admin));
        assert_eq!(
            Role::from_columns("kepala_dusun", Some("DUA"), None),
            Ok(Role::KepalaDusun { dusun: Hamlet::Dua })
        );
        assert!(Role::from_columns("kepala_dusun", None, None).is_err());
        assert!(Role::from_columns("masyarakat", None, Some("  ")).is_err());
        assert!(Role::from_columns("lurah", None, None).is_err());
    }
}
