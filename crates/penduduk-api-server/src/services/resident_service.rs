use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ensure, ServiceError, ServiceResult};
use super::validation::{is_sixteen_digits, normalize_form, MSG_NIK};
use crate::database::{Repository, ResidentOrder, RestoreOutcome, ACTIVITY_VIEW_LIMIT};
use crate::logging::{ActivityAction, ActivityLog, ActivityLogger};
use crate::models::{
    ActivityLogEntry, DeletionLogEntry, Household, ListQuery, ListRows, Principal, Resident,
    ResidentForm, ResidentPage, ViewMode, WriteOutcome, HEAD_OF_HOUSEHOLD,
};
use crate::security::authorization::{can_create, can_delete, can_edit, require_admin};
use crate::security::{Column, ResidentFilter, Scope};
use crate::utils::clock;

pub const MSG_NOT_FOUND: &str = "Data tidak ditemukan.";
pub const MSG_NIK_EXISTS: &str = "NIK sudah ada di database.";
pub const MSG_NIK_TAKEN: &str = "NIK sudah digunakan oleh orang lain!";
pub const MSG_SECOND_HEAD: &str = "Nomor KK sudah digunakan oleh kepala keluarga lain.";
pub const MSG_REASON_REQUIRED: &str = "Pilih satu alasan penghapusan.";
pub const MSG_INVALID_NIK: &str = "NIK tidak valid.";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

pub struct ResidentService {
    repository: Arc<Repository>,
    activity: ActivityLogger,
}

impl ResidentService {
    pub fn new(repository: Arc<Repository>, activity: ActivityLogger) -> Self {
        Self {
            repository,
            activity,
        }
    }

    /// Paged, searchable listing of the rows the caller may see. Header
    /// counters ignore the search term.
    pub async fn list(&self, principal: &Principal, query: &ListQuery) -> ServiceResult<ResidentPage> {
        let scoped = ResidentFilter::new(&Scope::for_principal(principal));
        let counts = self.repository.header_counts(&scoped).await?;

        let filter = scoped.search(query.search.as_deref());
        let total_rows = self.repository.count_residents(&filter).await?;
        let order = match query.view {
            ViewMode::Kk => ResidentOrder::Household,
            ViewMode::Nik => ResidentOrder::Name,
        };
        let rows = self
            .repository
            .list_residents(&filter, order, query.pagination.window())
            .await?;

        let rows = match query.view {
            ViewMode::Kk => ListRows::Households(Household::group(rows)),
            ViewMode::Nik => ListRows::Residents(rows),
        };

        Ok(ResidentPage {
            view: query.view,
            limit: query.pagination.limit.as_label(),
            page: query.pagination.page,
            total_rows,
            total_pages: query.pagination.total_pages(total_rows),
            counts,
            rows,
        })
    }

    /// Scoped lookup; rows outside the caller's scope read as missing.
    pub async fn find_visible(&self, principal: &Principal, nik: &str) -> ServiceResult<Option<Resident>> {
        let filter = ResidentFilter::new(&Scope::for_principal(principal)).eq(Column::Nik, nik.trim());
        Ok(self.repository.find_resident(&filter).await?)
    }

    pub async fn get(&self, principal: &Principal, nik: &str) -> ServiceResult<Resident> {
        self.find_visible(principal, nik)
            .await?
            .ok_or_else(|| ServiceError::NotFound(MSG_NOT_FOUND.to_string()))
    }

    /// Unscoped lookup, used before a role gate that reports its own reason.
    async fn find_any(&self, nik: &str) -> ServiceResult<Resident> {
        let filter = ResidentFilter::new(&Scope::All).eq(Column::Nik, nik.trim());
        self.repository
            .find_resident(&filter)
            .await?
            .ok_or_else(|| ServiceError::NotFound(MSG_NOT_FOUND.to_string()))
    }

    async fn head_warnings(&self, hubungan: &str, nomor_kk: &str, nik: &str) -> ServiceResult<Vec<String>> {
        if hubungan == HEAD_OF_HOUSEHOLD && self.repository.kk_has_head(nomor_kk, nik).await? {
            return Ok(vec![MSG_SECOND_HEAD.to_string()]);
        }
        Ok(Vec::new())
    }

    pub async fn create(&self, principal: &Principal, form: &ResidentForm) -> ServiceResult<WriteOutcome> {
        let mut resident = normalize_form(form)?;
        ensure(can_create(principal, resident.dusun))?;

        if self.repository.nik_exists(&resident.nik).await? {
            return Err(ServiceError::Conflict(MSG_NIK_EXISTS.to_string()));
        }
        let warnings = self
            .head_warnings(&resident.hubungan, &resident.nomor_kk, &resident.nik)
            .await?;

        resident.tanggal_input = clock::now_timestamp();
        match self.repository.insert_resident(&resident).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(ServiceError::Conflict(MSG_NIK_EXISTS.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        info!(user = %principal.username, nik = %resident.nik, "Resident created");
        self.activity.log(ActivityLog::new(
            &principal.username,
            ActivityAction::TambahPenduduk,
            format!("Tambah penduduk: {} ({})", resident.nama, resident.nik),
        ));
        Ok(WriteOutcome {
            nik: resident.nik,
            warnings,
        })
    }

    /// Replace the row currently stored under `nik`. Input timestamp and
    /// photo reference carry over from the stored row.
    pub async fn update(
        &self,
        principal: &Principal,
        nik: &str,
        form: &ResidentForm,
    ) -> ServiceResult<WriteOutcome> {
        let existing = self.find_any(nik).await?;
        let mut resident = normalize_form(form)?;
        ensure(can_edit(principal, &existing, resident.dusun, &resident.nik))?;

        if resident.nik != existing.nik && self.repository.nik_exists(&resident.nik).await? {
            return Err(ServiceError::Conflict(MSG_NIK_TAKEN.to_string()));
        }
        let warnings = self
            .head_warnings(&resident.hubungan, &resident.nomor_kk, &existing.nik)
            .await?;

        resident.tanggal_input = existing.tanggal_input.clone();
        resident.foto_ktp = existing.foto_ktp.clone();
        match self.repository.update_resident(existing.id, &resident).await {
            Ok(0) => return Err(ServiceError::NotFound(MSG_NOT_FOUND.to_string())),
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(ServiceError::Conflict(MSG_NIK_TAKEN.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        info!(user = %principal.username, nik = %resident.nik, "Resident updated");
        self.activity.log(ActivityLog::new(
            &principal.username,
            ActivityAction::EditPenduduk,
            format!("Edit penduduk: {} ({})", resident.nama, resident.nik),
        ));
        Ok(WriteOutcome {
            nik: resident.nik,
            warnings,
        })
    }

    /// Snapshot into the deletion log and remove, atomically.
    pub async fn delete(&self, principal: &Principal, nik: &str, reason: &str) -> ServiceResult<String> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::BadRequest(MSG_REASON_REQUIRED.to_string()));
        }
        let existing = self.find_any(nik).await?;
        ensure(can_delete(principal, &existing))?;

        let deleted = self
            .repository
            .delete_with_log(&existing.nik, reason, &principal.username, &clock::now_timestamp())
            .await?;
        if !deleted {
            return Err(ServiceError::NotFound(MSG_NOT_FOUND.to_string()));
        }

        info!(user = %principal.username, nik = %existing.nik, reason, "Resident deleted");
        self.activity.log(ActivityLog::new(
            &principal.username,
            ActivityAction::HapusPenduduk,
            format!("Hapus penduduk: {} ({}), alasan: {}", existing.nama, existing.nik, reason),
        ));
        Ok(format!("Data NIK {} berhasil dihapus!", existing.nik))
    }

    /// Bring back the most recent snapshot of `nik`. Admin only.
    pub async fn restore(&self, principal: &Principal, nik: &str) -> ServiceResult<String> {
        ensure(require_admin(principal))?;
        let nik = nik.trim();
        if !is_sixteen_digits(nik) {
            return Err(ServiceError::BadRequest(MSG_INVALID_NIK.to_string()));
        }

        match self
            .repository
            .restore_from_log(nik, &clock::now_timestamp())
            .await?
        {
            RestoreOutcome::Restored(entry) => {
                info!(user = %principal.username, nik, "Resident restored from deletion log");
                self.activity.log(ActivityLog::new(
                    &principal.username,
                    ActivityAction::RollbackPenduduk,
                    format!("Kembalikan penduduk: {} ({})", entry.nama, entry.nik),
                ));
                Ok(format!("Data NIK {} berhasil dikembalikan!", nik))
            }
            RestoreOutcome::NotInLog => Err(ServiceError::NotFound(format!(
                "Data dengan NIK {} tidak ditemukan di log.",
                nik
            ))),
            RestoreOutcome::AlreadyLive => {
                warn!(nik, "Restore refused, NIK is live");
                Err(ServiceError::Conflict(format!(
                    "NIK {} sudah ada di database. Tidak bisa dikembalikan.",
                    nik
                )))
            }
        }
    }

    pub async fn deletion_history(&self, principal: &Principal) -> ServiceResult<Vec<DeletionLogEntry>> {
        ensure(require_admin(principal))?;
        Ok(self.repository.deletion_history().await?)
    }

    pub async fn recent_activity(&self, principal: &Principal) -> ServiceResult<Vec<ActivityLogEntry>> {
        ensure(require_admin(principal))?;
        Ok(self.repository.recent_activity(ACTIVITY_VIEW_LIMIT).await?)
    }

    /// KK number of a visible NIK, for printing a card from a NIK.
    pub async fn household_of(&self, principal: &Principal, nik: &str) -> ServiceResult<String> {
        let nik = nik.trim();
        if nik.is_empty() {
            return Err(ServiceError::BadRequest("NIK tidak boleh kosong.".to_string()));
        }
        if !is_sixteen_digits(nik) {
            return Err(ServiceError::BadRequest(MSG_NIK.to_string()));
        }
        let resident = self.find_visible(principal, nik).await?.ok_or_else(|| {
            ServiceError::NotFound(
                "NIK tidak ditemukan atau Anda tidak berhak mengakses data ini.".to_string(),
            )
        })?;
        if resident.nomor_kk.trim().is_empty() {
            return Err(ServiceError::NotFound(
                "NIK ini tidak terdaftar sebagai anggota keluarga.".to_string(),
            ));
        }
        Ok(resident.nomor_kk)
    }
}
