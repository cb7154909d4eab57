use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub backup: BackupConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
    /// Password for the `admin` account created when the user table is empty
    pub bootstrap_admin_password: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub reports_dir: PathBuf,
    pub export_dir: PathBuf,
    pub chart_dir: PathBuf,
    pub template_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub logo_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportConfig {
    pub village_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackupConfig {
    pub enabled: bool,
    pub interval_hours: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProgressConfig {
    pub default_target: i64,
    #[serde(default)]
    pub targets: HashMap<String, i64>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(true))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}

impl DatabaseConfig {
    /// Filesystem path of the SQLite store, used by the backup job.
    pub fn file_path(&self) -> Option<PathBuf> {
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next().unwrap_or(rest);
        if path.is_empty() || path == ":memory:" {
            return None;
        }
        Some(PathBuf::from(path))
    }
}

impl StorageConfig {
    /// Create every output directory. The logo and template folders are
    /// read-only inputs and are left alone.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.reports_dir,
            &self.export_dir,
            &self.chart_dir,
            &self.backup_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Same layout rooted under `base`, handy for tests.
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            reports_dir: base.join("laporan/pdf"),
            export_dir: base.join("ekspor"),
            chart_dir: base.join("static/charts"),
            template_dir: base.join("template"),
            backup_dir: base.join("backup"),
            logo_path: base.join("static/img/logo_desa.png"),
        }
    }
}

impl ProgressConfig {
    /// Keys may come back lowercased from the config loader.
    pub fn target_for(&self, dusun: &str) -> i64 {
        self.targets
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(dusun))
            .map(|(_, v)| *v)
            .unwrap_or(self.default_target)
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        let targets = [("SATU", 150), ("DUA", 120), ("TIGA", 272), ("EMPAT", 140)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            default_target: 100,
            targets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 1,
        }
    }

    #[test]
    fn test_file_path_from_url() {
        assert_eq!(db("sqlite://desa.db").file_path(), Some(PathBuf::from("desa.db")));
        assert_eq!(
            db("sqlite:/var/lib/desa.db?mode=rwc").file_path(),
            Some(PathBuf::from("/var/lib/desa.db"))
        );
        assert_eq!(db("sqlite::memory:").file_path(), None);
        assert_eq!(db("postgres://x").file_path(), None);
    }

    #[test]
    fn test_progress_targets() {
        let progress = ProgressConfig::default();
        assert_eq!(progress.target_for("TIGA"), 272);
        assert_eq!(progress.target_for("LIMA"), 100);
    }
}
