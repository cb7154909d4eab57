//! Administrative audit trail with an async queue in front of `log_aktivitas`.

mod logger;
pub mod types;

pub use logger::{ActivityLogger, LoggerConfig};
pub use types::{ActivityAction, ActivityLog};
