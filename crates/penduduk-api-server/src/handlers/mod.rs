pub mod audit;
pub mod auth;
pub mod health;
pub mod import;
pub mod reports;
pub mod residents;
pub mod statistics;
pub mod users;
