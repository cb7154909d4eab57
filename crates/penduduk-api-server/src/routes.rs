use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers;
use crate::security::require_auth;
use crate::state::AppState;

/// Upload cap for spreadsheet imports (20MB)
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Public routes (no login)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/api/auth/login", post(handlers::auth::login));

    // Protected routes (bearer token resolved to a Principal)
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        // Residents
        .route(
            "/api/penduduk",
            get(handlers::residents::list).post(handlers::residents::create),
        )
        .route("/api/penduduk/import", post(handlers::import::upload))
        .route("/api/penduduk/export", get(handlers::residents::export))
        .route(
            "/api/penduduk/{nik}",
            get(handlers::residents::get)
                .put(handlers::residents::update)
                .delete(handlers::residents::delete),
        )
        .route(
            "/api/template/{filename}",
            get(handlers::import::download_template),
        )
        // Printing
        .route("/api/cetak", get(handlers::reports::print_menu))
        .route("/api/cetak/kk/semua", get(handlers::reports::all_family_cards))
        .route(
            "/api/cetak/kk/dari-nik",
            post(handlers::reports::family_card_by_nik),
        )
        .route("/api/cetak/kk/{nomor_kk}", get(handlers::reports::family_card))
        .route(
            "/api/cetak/kk/dusun/{dusun}",
            get(handlers::reports::hamlet_family_cards),
        )
        .route("/api/cetak/daftar/semua", get(handlers::reports::roster))
        .route(
            "/api/cetak/daftar/dusun/{dusun}",
            get(handlers::reports::hamlet_roster),
        )
        .route("/api/cetak/statistik", get(handlers::reports::statistics))
        // Statistics
        .route("/api/statistik", get(handlers::statistics::statistics))
        .route("/api/dashboard", get(handlers::statistics::dashboard))
        .route(
            "/api/dashboard/chart/{name}",
            get(handlers::statistics::dashboard_chart),
        )
        .route("/api/progress", get(handlers::statistics::progress))
        // Administration
        .route(
            "/api/users",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route("/api/riwayat-hapus", get(handlers::audit::deletion_history))
        .route(
            "/api/riwayat-hapus/{nik}/restore",
            post(handlers::audit::restore),
        )
        .route("/api/log-aktivitas", get(handlers::audit::activity_log))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
