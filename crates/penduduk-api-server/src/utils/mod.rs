pub mod clock;
pub mod error;
pub mod files;
pub mod response;
pub mod telemetry;
