use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::utils::clock;

/// Periodic file copy of the SQLite store into the backup directory.
#[derive(Debug, Clone)]
pub struct BackupScheduler {
    source: PathBuf,
    backup_dir: PathBuf,
    period: Duration,
}

impl BackupScheduler {
    pub fn new(source: PathBuf, backup_dir: PathBuf, period: Duration) -> Self {
        Self {
            source,
            backup_dir,
            period,
        }
    }

    pub fn from_hours(source: PathBuf, backup_dir: PathBuf, hours: u64) -> Self {
        Self::new(source, backup_dir, Duration::from_secs(hours.max(1) * 3600))
    }

    fn target_path(&self) -> PathBuf {
        self.backup_dir
            .join(format!("desa_{}.db", clock::file_stamp()))
    }

    /// Copy the store once and return the backup path.
    pub async fn run_once(&self) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.backup_dir).await?;
        let target = self.target_path();
        let bytes = tokio::fs::copy(&self.source, &target).await?;
        info!(source = %self.source.display(), target = %target.display(), bytes, "Store backed up");
        Ok(target)
    }

    /// First copy one period after start, then every period. Failures are
    /// logged and the timer keeps running.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(every_secs = self.period.as_secs(), "Backup scheduler started");
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!(source = %self.source.display(), "Backup failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_once_copies_store() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("desa.db");
        std::fs::write(&source, b"sqlite bytes").unwrap();

        let scheduler = BackupScheduler::from_hours(source, dir.path().join("backup"), 24);
        let target = scheduler.run_once().await.unwrap();

        let name = target.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("desa_") && name.ends_with(".db"));
        assert_eq!(std::fs::read(&target).unwrap(), b"sqlite bytes");
    }

    #[tokio::test]
    async fn test_missing_store_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler =
            BackupScheduler::from_hours(dir.path().join("absent.db"), dir.path().join("b"), 1);
        assert!(scheduler.run_once().await.is_err());
    }
}
