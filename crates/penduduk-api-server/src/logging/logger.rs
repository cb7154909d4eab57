use flume::{bounded, Receiver, Sender};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::types::ActivityLog;

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Queue capacity (max entries in memory before backpressure)
    pub queue_capacity: usize,

    /// Batch size for database inserts
    pub batch_size: usize,

    /// Max wait time before flushing batch (milliseconds)
    pub batch_timeout_ms: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1_000,
            batch_size: 20,
            batch_timeout_ms: 500,
        }
    }
}

/// Async activity logger. A single worker drains the queue since SQLite
/// takes one writer at a time anyway.
#[derive(Clone)]
pub struct ActivityLogger {
    sender: Sender<ActivityLog>,
}

impl ActivityLogger {
    pub fn new(pool: SqlitePool, config: LoggerConfig) -> Self {
        let (sender, receiver) = bounded(config.queue_capacity);

        info!(
            "Initializing ActivityLogger: queue={}, batch={}, timeout={}ms",
            config.queue_capacity, config.batch_size, config.batch_timeout_ms
        );

        tokio::spawn(async move {
            Self::worker_loop(pool, receiver, config).await;
        });

        Self { sender }
    }

    /// Enqueue an entry (non-blocking, fire-and-forget)
    pub fn log(&self, activity: ActivityLog) {
        if let Err(e) = self.sender.try_send(activity) {
            warn!("Failed to enqueue activity (queue full?): {}", e);
        }
    }

    async fn worker_loop(pool: SqlitePool, receiver: Receiver<ActivityLog>, config: LoggerConfig) {
        let mut batch: Vec<ActivityLog> = Vec::with_capacity(config.batch_size);
        let batch_timeout = Duration::from_millis(config.batch_timeout_ms);

        loop {
            let deadline = tokio::time::Instant::now() + batch_timeout;

            while batch.len() < config.batch_size {
                match tokio::time::timeout_at(deadline, receiver.recv_async()).await {
                    Ok(Ok(entry)) => batch.push(entry),
                    Ok(Err(_)) => {
                        // Channel closed, flush and exit
                        if !batch.is_empty() {
                            Self::flush_batch(&pool, &batch).await;
                        }
                        info!("Activity logger shutting down (channel closed)");
                        return;
                    }
                    Err(_) => break,
                }
            }

            if !batch.is_empty() {
                Self::flush_batch(&pool, &batch).await;
                batch.clear();
            } else {
                sleep(Duration::from_millis(100)).await;
            }
        }
    }

    async fn flush_batch(pool: &SqlitePool, batch: &[ActivityLog]) {
        match Self::insert_batch(pool, batch).await {
            Ok(inserted) => debug!("Flushed {} activity entries", inserted),
            Err(e) => error!("Failed to insert activity batch: {}", e),
        }
    }

    async fn insert_batch(pool: &SqlitePool, entries: &[ActivityLog]) -> sqlx::Result<usize> {
        let mut query_builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "INSERT INTO log_aktivitas (username, aksi, detail, timestamp) ",
        );

        query_builder.push_values(entries, |mut b, entry| {
            b.push_bind(entry.username.as_str())
                .push_bind(entry.action.as_str())
                .push_bind(entry.detail.as_str())
                .push_bind(entry.timestamp.as_str());
        });

        let result = query_builder.build().execute(pool).await?;
        Ok(result.rows_affected() as usize)
    }
}
