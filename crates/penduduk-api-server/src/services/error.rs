use thiserror::Error;

use super::import_service::ImportError;
use super::validation::ValidationError;
use crate::charts::ChartError;
use crate::report::ReportError;
use crate::security::Decision;
use crate::spreadsheet::SheetError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] SheetError),

    #[error("chart error: {0}")]
    Chart(#[from] ChartError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Turn a denied decision into `Forbidden`.
pub fn ensure(decision: Decision) -> ServiceResult<()> {
    match decision {
        Decision::Allowed => Ok(()),
        Decision::Denied(msg) => Err(ServiceError::Forbidden(msg.to_string())),
    }
}
