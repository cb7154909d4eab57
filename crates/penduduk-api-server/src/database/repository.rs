use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use tracing::debug;

use super::DbPool;
use crate::models::{DeletionLogEntry, HeaderCounts, NewResident, Resident, HEAD_OF_HOUSEHOLD};
use crate::security::ResidentFilter;

pub(crate) const RESIDENT_COLUMNS: &str = "id, nik, nomor_kk, nama, hubungan, jenis_kelamin, \
     tempat_lahir, tanggal_lahir, agama, status_perkawinan, pendidikan, pekerjaan, alamat, \
     rt_rw, dusun, golongan_darah, kesejahteraan, tanggal_input, foto_ktp";

/// Snapshot columns shared by `penduduk` and `log_penghapusan`.
const SNAPSHOT_COLUMNS: &str = "nik, nomor_kk, nama, hubungan, jenis_kelamin, tempat_lahir, \
     tanggal_lahir, agama, status_perkawinan, pendidikan, pekerjaan, alamat, rt_rw, dusun, \
     golongan_darah, kesejahteraan, foto_ktp";

const HEAD_FIRST: &str = "CASE WHEN hubungan = 'Kepala Keluarga' THEN 0 ELSE 1 END";

/// Row ordering for listings and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidentOrder {
    /// KK number, head first, then name.
    Household,
    /// Name only.
    Name,
    /// Hamlet, then household order.
    Roster,
}

impl ResidentOrder {
    fn as_sql(&self) -> String {
        match self {
            Self::Household => format!(" ORDER BY nomor_kk, {}, nama", HEAD_FIRST),
            Self::Name => " ORDER BY nama".to_string(),
            Self::Roster => format!(" ORDER BY dusun, nomor_kk, {}, nama", HEAD_FIRST),
        }
    }
}

/// Result of an import upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    Inserted,
    Updated,
}

/// Result of restoring a NIK from the deletion log.
#[derive(Debug, Clone)]
pub enum RestoreOutcome {
    Restored(DeletionLogEntry),
    NotInLog,
    AlreadyLive,
}

pub struct Repository {
    pub pool: DbPool,
}

fn bind_resident<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    r: &'q NewResident,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(r.nik.as_str())
        .bind(r.nomor_kk.as_str())
        .bind(r.nama.as_str())
        .bind(r.hubungan.as_str())
        .bind(r.jenis_kelamin.as_str())
        .bind(r.tempat_lahir.as_str())
        .bind(r.tanggal_lahir.as_str())
        .bind(r.agama.as_str())
        .bind(r.status_perkawinan.as_str())
        .bind(r.pendidikan.as_str())
        .bind(r.pekerjaan.as_str())
        .bind(r.alamat.as_str())
        .bind(r.rt_rw.as_str())
        .bind(r.dusun.as_str())
        .bind(r.golongan_darah.as_str())
        .bind(r.kesejahteraan.as_str())
        .bind(r.tanggal_input.as_str())
        .bind(r.foto_ktp.as_str())
}

const INSERT_RESIDENT: &str = r#"INSERT INTO penduduk (
        nik, nomor_kk, nama, hubungan, jenis_kelamin, tempat_lahir, tanggal_lahir,
        agama, status_perkawinan, pendidikan, pekerjaan, alamat, rt_rw, dusun,
        golongan_darah, kesejahteraan, tanggal_input, foto_ktp
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#;

impl Repository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Rows matching `filter`, optionally windowed by `(limit, offset)`.
    pub async fn list_residents(
        &self,
        filter: &ResidentFilter,
        order: ResidentOrder,
        window: Option<(i64, i64)>,
    ) -> sqlx::Result<Vec<Resident>> {
        let mut sql = format!(
            "SELECT {} FROM penduduk{}{}",
            RESIDENT_COLUMNS,
            filter.where_sql(),
            order.as_sql()
        );
        if let Some((limit, offset)) = window {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }
        debug!("list_residents: {}", sql);

        let mut query = sqlx::query_as::<_, Resident>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        query.fetch_all(self.pool.get_pool()).await
    }

    pub async fn count_residents(&self, filter: &ResidentFilter) -> sqlx::Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM penduduk{}", filter.where_sql());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        query.fetch_one(self.pool.get_pool()).await
    }

    pub async fn header_counts(&self, filter: &ResidentFilter) -> sqlx::Result<HeaderCounts> {
        let sql = format!(
            "SELECT COUNT(*), COUNT(DISTINCT NULLIF(TRIM(nomor_kk), '')), \
                    COUNT(DISTINCT NULLIF(TRIM(dusun), '')) FROM penduduk{}",
            filter.where_sql()
        );
        let mut query = sqlx::query_as::<_, (i64, i64, i64)>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        let (total_penduduk, total_kk, total_dusun) =
            query.fetch_one(self.pool.get_pool()).await?;
        Ok(HeaderCounts {
            total_penduduk,
            total_kk,
            total_dusun,
        })
    }

    /// First row matching the filter.
    pub async fn find_resident(&self, filter: &ResidentFilter) -> sqlx::Result<Option<Resident>> {
        let sql = format!(
            "SELECT {} FROM penduduk{} LIMIT 1",
            RESIDENT_COLUMNS,
            filter.where_sql()
        );
        let mut query = sqlx::query_as::<_, Resident>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        query.fetch_optional(self.pool.get_pool()).await
    }

    pub async fn nik_exists(&self, nik: &str) -> sqlx::Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM penduduk WHERE nik = ?")
            .bind(nik)
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(count > 0)
    }

    /// Whether `nomor_kk` already has a head other than `except_nik`.
    pub async fn kk_has_head(&self, nomor_kk: &str, except_nik: &str) -> sqlx::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM penduduk WHERE nomor_kk = ? AND hubungan = ? AND nik != ?",
        )
        .bind(nomor_kk)
        .bind(HEAD_OF_HOUSEHOLD)
        .bind(except_nik)
        .fetch_one(self.pool.get_pool())
        .await?;
        Ok(count > 0)
    }

    pub async fn insert_resident(&self, resident: &NewResident) -> sqlx::Result<i64> {
        let result = bind_resident(sqlx::query(INSERT_RESIDENT), resident)
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite the row with primary key `id`.
    pub async fn update_resident(&self, id: i64, resident: &NewResident) -> sqlx::Result<u64> {
        let query = sqlx::query(
            r#"UPDATE penduduk SET
                nik = ?, nomor_kk = ?, nama = ?, hubungan = ?, jenis_kelamin = ?,
                tempat_lahir = ?, tanggal_lahir = ?, agama = ?, status_perkawinan = ?,
                pendidikan = ?, pekerjaan = ?, alamat = ?, rt_rw = ?, dusun = ?,
                golongan_darah = ?, kesejahteraan = ?, tanggal_input = ?, foto_ktp = ?
               WHERE id = ?"#,
        );
        let result = bind_resident(query, resident)
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert or replace by NIK. The existence check and the write share a
    /// transaction so the reported kind matches what was written.
    pub async fn upsert_resident(&self, resident: &NewResident) -> sqlx::Result<UpsertKind> {
        let mut tx = self.pool.get_pool().begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM penduduk WHERE nik = ?")
            .bind(resident.nik.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            r#"{} ON CONFLICT(nik) DO UPDATE SET
                nomor_kk = excluded.nomor_kk, nama = excluded.nama,
                hubungan = excluded.hubungan, jenis_kelamin = excluded.jenis_kelamin,
                tempat_lahir = excluded.tempat_lahir, tanggal_lahir = excluded.tanggal_lahir,
                agama = excluded.agama, status_perkawinan = excluded.status_perkawinan,
                pendidikan = excluded.pendidikan, pekerjaan = excluded.pekerjaan,
                alamat = excluded.alamat, rt_rw = excluded.rt_rw, dusun = excluded.dusun,
                golongan_darah = excluded.golongan_darah,
                kesejahteraan = excluded.kesejahteraan,
                tanggal_input = excluded.tanggal_input, foto_ktp = excluded.foto_ktp"#,
            INSERT_RESIDENT
        );
        bind_resident(sqlx::query(&sql), resident)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(if existing > 0 {
            UpsertKind::Updated
        } else {
            UpsertKind::Inserted
        })
    }

    /// Snapshot the row into `log_penghapusan`, then delete it. Returns
    /// false when no row with `nik` existed.
    pub async fn delete_with_log(
        &self,
        nik: &str,
        reason: &str,
        actor: &str,
        timestamp: &str,
    ) -> sqlx::Result<bool> {
        let mut tx = self.pool.get_pool().begin().await?;

        let sql = format!(
            "INSERT INTO log_penghapusan ({cols}, alasan_hapus, dihapus_oleh, tanggal_hapus) \
             SELECT {cols}, ?, ?, ? FROM penduduk WHERE nik = ?",
            cols = SNAPSHOT_COLUMNS
        );
        let logged = sqlx::query(&sql)
            .bind(reason)
            .bind(actor)
            .bind(timestamp)
            .bind(nik)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if logged == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM penduduk WHERE nik = ?")
            .bind(nik)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Re-insert the most recent snapshot of `nik` with a fresh input
    /// timestamp and drop every log entry for that NIK.
    pub async fn restore_from_log(&self, nik: &str, timestamp: &str) -> sqlx::Result<RestoreOutcome> {
        let mut tx = self.pool.get_pool().begin().await?;

        let entry = sqlx::query_as::<_, DeletionLogEntry>(&format!(
            "SELECT id, {}, alasan_hapus, dihapus_oleh, tanggal_hapus \
             FROM log_penghapusan WHERE nik = ? ORDER BY id DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        ))
        .bind(nik)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(entry) = entry else {
            return Ok(RestoreOutcome::NotInLog);
        };

        let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM penduduk WHERE nik = ?")
            .bind(nik)
            .fetch_one(&mut *tx)
            .await?;
        if live > 0 {
            return Ok(RestoreOutcome::AlreadyLive);
        }

        sqlx::query(&format!(
            "INSERT INTO penduduk ({cols}, tanggal_input) \
             SELECT {cols}, ? FROM log_penghapusan WHERE id = ?",
            cols = SNAPSHOT_COLUMNS
        ))
        .bind(timestamp)
        .bind(entry.id)
        .execute(&mut *tx)
        .await?;

        // older snapshots of the same NIK go too
        sqlx::query("DELETE FROM log_penghapusan WHERE nik = ?")
            .bind(nik)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(RestoreOutcome::Restored(entry))
    }

    /// Hamlets that have at least one visible resident.
    pub async fn populated_hamlets(&self, filter: &ResidentFilter) -> sqlx::Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT dusun FROM penduduk{} ORDER BY dusun",
            filter.where_sql()
        );
        let mut query = sqlx::query_scalar::<_, String>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        query.fetch_all(self.pool.get_pool()).await
    }
}
