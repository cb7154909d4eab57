use anyhow::Result;
use std::net::SocketAddr;
use tracing::{info, warn};

use penduduk_api_server::config::Settings;
use penduduk_api_server::routes::build_router;
use penduduk_api_server::services::BackupScheduler;
use penduduk_api_server::state::AppState;
use penduduk_api_server::utils::telemetry::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (also reads .env)
    let settings = Settings::load()?;

    init_logger()?;
    info!("🚀 Starting penduduk API server...");

    settings.storage.ensure_dirs()?;
    info!("✅ Output directories ready");

    let state = AppState::build(settings.clone()).await?;
    info!("✅ Database connection established");

    state
        .auth
        .bootstrap_admin(&settings.auth.bootstrap_admin_password)
        .await?;

    if settings.backup.enabled {
        match settings.database.file_path() {
            Some(source) => {
                BackupScheduler::from_hours(
                    source,
                    settings.storage.backup_dir.clone(),
                    settings.backup.interval_hours,
                )
                .spawn();
                info!(
                    "✅ Backup every {} hour(s) into {}",
                    settings.backup.interval_hours,
                    settings.storage.backup_dir.display()
                );
            }
            None => warn!("Backup enabled but database is not a file, skipping"),
        }
    }

    let app = build_router(state);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
