pub mod auth;
pub mod charts;
pub mod config;
pub mod database;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod report;
pub mod routes;
pub mod security;
pub mod services;
pub mod spreadsheet;
pub mod state;
pub mod utils;
