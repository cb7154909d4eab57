use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS penduduk (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nomor_kk TEXT NOT NULL DEFAULT '',
        nik TEXT NOT NULL UNIQUE,
        nama TEXT NOT NULL DEFAULT '',
        hubungan TEXT NOT NULL DEFAULT '',
        jenis_kelamin TEXT NOT NULL DEFAULT '',
        tempat_lahir TEXT NOT NULL DEFAULT '',
        tanggal_lahir TEXT NOT NULL DEFAULT '',
        agama TEXT NOT NULL DEFAULT '',
        status_perkawinan TEXT NOT NULL DEFAULT '',
        pendidikan TEXT NOT NULL DEFAULT '',
        pekerjaan TEXT NOT NULL DEFAULT '',
        alamat TEXT NOT NULL DEFAULT '',
        rt_rw TEXT NOT NULL DEFAULT '',
        dusun TEXT NOT NULL DEFAULT '',
        golongan_darah TEXT NOT NULL DEFAULT '',
        kesejahteraan TEXT NOT NULL DEFAULT '',
        tanggal_input TEXT NOT NULL DEFAULT '',
        foto_ktp TEXT NOT NULL DEFAULT ''
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_penduduk_kk ON penduduk (nomor_kk)",
    "CREATE INDEX IF NOT EXISTS idx_penduduk_dusun ON penduduk (dusun)",
    r#"CREATE TABLE IF NOT EXISTS "user" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        dusun TEXT,
        nik_masyarakat TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS log_penghapusan (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nik TEXT NOT NULL,
        nomor_kk TEXT NOT NULL DEFAULT '',
        nama TEXT NOT NULL DEFAULT '',
        hubungan TEXT NOT NULL DEFAULT '',
        jenis_kelamin TEXT NOT NULL DEFAULT '',
        tempat_lahir TEXT NOT NULL DEFAULT '',
        tanggal_lahir TEXT NOT NULL DEFAULT '',
        agama TEXT NOT NULL DEFAULT '',
        status_perkawinan TEXT NOT NULL DEFAULT '',
        pendidikan TEXT NOT NULL DEFAULT '',
        pekerjaan TEXT NOT NULL DEFAULT '',
        alamat TEXT NOT NULL DEFAULT '',
        rt_rw TEXT NOT NULL DEFAULT '',
        dusun TEXT NOT NULL DEFAULT '',
        golongan_darah TEXT NOT NULL DEFAULT '',
        kesejahteraan TEXT NOT NULL DEFAULT '',
        foto_ktp TEXT NOT NULL DEFAULT '',
        alasan_hapus TEXT NOT NULL DEFAULT '',
        dihapus_oleh TEXT NOT NULL DEFAULT '',
        tanggal_hapus TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_log_penghapusan_nik ON log_penghapusan (nik)",
    r#"CREATE TABLE IF NOT EXISTS log_aktivitas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        aksi TEXT NOT NULL,
        detail TEXT NOT NULL DEFAULT '',
        timestamp TEXT NOT NULL
    )"#,
];

#[derive(Clone)]
pub struct DbPool {
    pool: SqlitePool,
}

impl DbPool {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        info!("SQLite store ready at {}", config.url);
        Ok(db)
    }

    /// Create tables and indexes when they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}
