pub mod authorization;
pub mod middleware;
pub mod scope;

pub use authorization::{Decision, MSG_ACCESS_DENIED, MSG_FEATURE_DENIED};
pub use middleware::require_auth;
pub use scope::{Column, ResidentFilter, Scope};
