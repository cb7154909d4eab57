use serde::Serialize;
use sqlx::FromRow;

/// Snapshot of a deleted resident (`log_penghapusan`).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DeletionLogEntry {
    pub id: i64,
    pub nik: String,
    pub nomor_kk: String,
    pub nama: String,
    pub hubungan: String,
    pub jenis_kelamin: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: String,
    pub agama: String,
    pub status_perkawinan: String,
    pub pendidikan: String,
    pub pekerjaan: String,
    pub alamat: String,
    pub rt_rw: String,
    pub dusun: String,
    pub golongan_darah: String,
    pub kesejahteraan: String,
    pub foto_ktp: String,
    pub alasan_hapus: String,
    pub dihapus_oleh: String,
    pub tanggal_hapus: String,
}

/// One row of the administrative audit trail (`log_aktivitas`).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub username: String,
    pub aksi: String,
    pub detail: String,
    pub timestamp: String,
}
