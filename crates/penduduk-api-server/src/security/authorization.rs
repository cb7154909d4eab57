//! Per-operation role gates. Each check returns a `Decision` the caller
//! turns into a 403 when denied.

use crate::models::{Hamlet, Principal, Resident, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

pub const MSG_ACCESS_DENIED: &str = "Akses ditolak.";
pub const MSG_FEATURE_DENIED: &str = "Anda tidak diizinkan mengakses fitur ini.";

pub fn can_create(principal: &Principal, dusun: Hamlet) -> Decision {
    match &principal.role {
        Role::Admin => Decision::Allowed,
        Role::KepalaDusun { dusun: own } if *own == dusun => Decision::Allowed,
        Role::KepalaDusun { .. } => Decision::Denied("Anda hanya bisa input data di dusun Anda."),
        Role::Masyarakat { .. } => Decision::Denied("Anda tidak diizinkan menambah data."),
    }
}

/// `existing` is the stored row, `new_dusun`/`new_nik` the submitted values.
pub fn can_edit(
    principal: &Principal,
    existing: &Resident,
    new_dusun: Hamlet,
    new_nik: &str,
) -> Decision {
    match &principal.role {
        Role::Admin => Decision::Allowed,
        Role::KepalaDusun { dusun } => {
            if existing.dusun != dusun.as_str() {
                Decision::Denied("Anda tidak diizinkan mengedit data di dusun ini.")
            } else if new_dusun != *dusun {
                Decision::Denied("Anda hanya bisa input data di dusun Anda.")
            } else {
                Decision::Allowed
            }
        }
        Role::Masyarakat { nik } => {
            if &existing.nik != nik {
                Decision::Denied("Anda hanya bisa mengedit data milik Anda.")
            } else if new_nik != nik {
                Decision::Denied("Anda tidak diizinkan mengubah NIK Anda sendiri.")
            } else {
                Decision::Allowed
            }
        }
    }
}

pub fn can_delete(principal: &Principal, existing: &Resident) -> Decision {
    match &principal.role {
        Role::Admin => Decision::Allowed,
        Role::KepalaDusun { dusun } if existing.dusun == dusun.as_str() => Decision::Allowed,
        Role::KepalaDusun { .. } => {
            Decision::Denied("Anda tidak diizinkan menghapus data di dusun ini.")
        }
        Role::Masyarakat { .. } => Decision::Denied("Anda tidak diizinkan menghapus data."),
    }
}

pub fn can_import(principal: &Principal) -> Decision {
    match principal.role {
        Role::Admin | Role::KepalaDusun { .. } => Decision::Allowed,
        Role::Masyarakat { .. } => {
            Decision::Denied("Anda tidak diizinkan mengakses halaman ini.")
        }
    }
}

/// Per-hamlet printouts: admin for any hamlet, a hamlet head for their own.
pub fn can_print_hamlet(principal: &Principal, dusun: Hamlet, roster: bool) -> Decision {
    match &principal.role {
        Role::Admin => Decision::Allowed,
        Role::KepalaDusun { dusun: own } if *own == dusun => Decision::Allowed,
        Role::KepalaDusun { .. } if roster => {
            Decision::Denied("Anda hanya bisa cetak daftar di dusun Anda.")
        }
        Role::KepalaDusun { .. } => Decision::Denied("Anda hanya bisa cetak KK di dusun Anda."),
        Role::Masyarakat { .. } => Decision::Denied(MSG_FEATURE_DENIED),
    }
}

/// Aggregations by religion and education.
pub fn can_view_breakdowns(principal: &Principal) -> bool {
    !matches!(principal.role, Role::Masyarakat { .. })
}

pub fn require_admin(principal: &Principal) -> Decision {
    if principal.role.is_admin() {
        Decision::Allowed
    } else {
        Decision::Denied(MSG_ACCESS_DENIED)
    }
}
