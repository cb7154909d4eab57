use serde::{Deserialize, Serialize};

use crate::utils::clock;

/// Audited administrative actions, stored by their uppercase code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    TambahPenduduk,
    EditPenduduk,
    HapusPenduduk,
    RollbackPenduduk,
    ImporExcel,
    EksporExcel,
    TambahUser,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TambahPenduduk => "TAMBAH_PENDUDUK",
            Self::EditPenduduk => "EDIT_PENDUDUK",
            Self::HapusPenduduk => "HAPUS_PENDUDUK",
            Self::RollbackPenduduk => "ROLLBACK_PENDUDUK",
            Self::ImporExcel => "IMPOR_EXCEL",
            Self::EksporExcel => "EKSPOR_EXCEL",
            Self::TambahUser => "TAMBAH_USER",
        }
    }
}

/// One queued audit entry.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub username: String,
    pub action: ActivityAction,
    pub detail: String,
    pub timestamp: String,
}

impl ActivityLog {
    pub fn new(username: &str, action: ActivityAction, detail: impl Into<String>) -> Self {
        Self {
            username: username.to_string(),
            action,
            detail: detail.into(),
            timestamp: clock::now_timestamp(),
        }
    }
}
