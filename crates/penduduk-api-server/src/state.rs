use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::auth::{JwtManager, UserDirectory};
use crate::config::Settings;
use crate::database::{DbPool, Repository};
use crate::logging::{ActivityLogger, LoggerConfig};
use crate::report::ReportRenderer;
use crate::services::{
    AuthService, ExportService, ImportService, ReportService, ResidentService, StatisticsService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub repository: Arc<Repository>,
    pub directory: Arc<UserDirectory>,
    pub jwt: Arc<JwtManager>,
    pub activity: ActivityLogger,
    pub auth: Arc<AuthService>,
    pub residents: Arc<ResidentService>,
    pub importer: Arc<ImportService>,
    pub exporter: Arc<ExportService>,
    pub reports: Arc<ReportService>,
    pub statistics: Arc<StatisticsService>,
}

impl AppState {
    /// Open the store from settings and wire every service.
    pub async fn build(settings: Settings) -> Result<Self> {
        let pool = DbPool::new(&settings.database).await?;
        Self::with_pool(settings, pool).await
    }

    pub async fn with_pool(settings: Settings, pool: DbPool) -> Result<Self> {
        let activity = ActivityLogger::new(pool.get_pool().clone(), LoggerConfig::default());
        let repository = Arc::new(Repository::new(pool));

        let directory = Arc::new(UserDirectory::new(repository.clone()));
        directory.reload().await?;

        let jwt = Arc::new(JwtManager::new(
            &settings.auth.jwt_secret,
            settings.auth.token_ttl_seconds,
        ));
        let renderer = Arc::new(ReportRenderer::new(
            settings.report.village_name.clone(),
            settings.storage.logo_path.clone(),
        ));

        let auth = Arc::new(AuthService::new(
            repository.clone(),
            directory.clone(),
            jwt.clone(),
            activity.clone(),
        ));
        let residents = Arc::new(ResidentService::new(repository.clone(), activity.clone()));
        let importer = Arc::new(ImportService::new(repository.clone(), activity.clone()));
        let exporter = Arc::new(ExportService::new(
            repository.clone(),
            activity.clone(),
            settings.storage.export_dir.clone(),
        ));
        let reports = Arc::new(ReportService::new(
            repository.clone(),
            renderer,
            settings.storage.reports_dir.clone(),
        ));
        let statistics = Arc::new(StatisticsService::new(
            repository.clone(),
            settings.storage.chart_dir.clone(),
            settings.progress.clone(),
        ));

        info!("Application state ready");
        Ok(Self {
            settings: Arc::new(settings),
            repository,
            directory,
            jwt,
            activity,
            auth,
            residents,
            importer,
            exporter,
            reports,
            statistics,
        })
    }
}
