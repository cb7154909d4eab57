use super::Repository;
use crate::models::{ActivityLogEntry, DeletionLogEntry};

/// Newest entries shown in the activity view.
pub const ACTIVITY_VIEW_LIMIT: i64 = 200;

impl Repository {
    pub async fn deletion_history(&self) -> sqlx::Result<Vec<DeletionLogEntry>> {
        sqlx::query_as::<_, DeletionLogEntry>(
            r#"SELECT id, nik, nomor_kk, nama, hubungan, jenis_kelamin, tempat_lahir,
                      tanggal_lahir, agama, status_perkawinan, pendidikan, pekerjaan, alamat,
                      rt_rw, dusun, golongan_darah, kesejahteraan, foto_ktp,
                      alasan_hapus, dihapus_oleh, tanggal_hapus
               FROM log_penghapusan
               ORDER BY tanggal_hapus DESC, id DESC"#,
        )
        .fetch_all(self.pool.get_pool())
        .await
    }

    pub async fn recent_activity(&self, limit: i64) -> sqlx::Result<Vec<ActivityLogEntry>> {
        sqlx::query_as::<_, ActivityLogEntry>(
            "SELECT id, username, aksi, detail, timestamp FROM log_aktivitas \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool.get_pool())
        .await
    }
}
