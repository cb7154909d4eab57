pub mod auth_service;
pub mod backup;
pub mod error;
pub mod export_service;
pub mod import_service;
pub mod report_service;
pub mod resident_service;
pub mod statistics_service;
pub mod validation;

pub use auth_service::AuthService;
pub use backup::BackupScheduler;
pub use error::{ServiceError, ServiceResult};
pub use export_service::ExportService;
pub use import_service::{ImportError, ImportService, ImportSummary};
pub use report_service::ReportService;
pub use resident_service::ResidentService;
pub use statistics_service::{DashboardView, ProgressView, StatisticsService, StatisticsView};
pub use validation::ValidationError;
