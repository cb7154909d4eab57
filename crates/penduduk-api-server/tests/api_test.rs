mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{admin, id16, seed, test_state, user_form, ADMIN_PASSWORD};
use penduduk_api_server::routes::build_router;
use penduduk_api_server::services::ServiceError;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let (state, _dir) = test_state().await;
    let app = build_router(state);

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let (state, _dir) = test_state().await;
    let app = build_router(state);

    let (status, _) = send(&app, get("/api/penduduk", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/penduduk", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let (state, _dir) = test_state().await;
    state.auth.bootstrap_admin(ADMIN_PASSWORD).await.unwrap();
    let app = build_router(state);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "admin", "password": "salah" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_admin_session_flow() {
    let (state, _dir) = test_state().await;
    assert!(state.auth.bootstrap_admin(ADMIN_PASSWORD).await.unwrap());
    assert!(!state.auth.bootstrap_admin(ADMIN_PASSWORD).await.unwrap());
    seed(&state).await;
    let app = build_router(state);

    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (status, body) = send(&app, get("/api/penduduk?view=nik&limit=all", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_rows"], 4);

    let (status, body) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/penduduk/{}", id16(2)),
            Some(&token),
            json!({ "alasan": "Meninggal" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = send(&app, get("/api/riwayat-hapus", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/riwayat-hapus/{}/restore", id16(2)),
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get(&format!("/api/penduduk/{}", id16(2)), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_resident_account_is_confined() {
    let (state, _dir) = test_state().await;
    seed(&state).await;
    state
        .auth
        .create_user(&admin(), &user_form("ani", "masyarakat", None, Some(&id16(4))))
        .await
        .unwrap();
    let app = build_router(state);

    let token = login(&app, "ani", "sandi123").await;

    let (status, body) = send(&app, get("/api/penduduk?view=nik", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_rows"], 1);

    let (status, _) = send(&app, get(&format!("/api/penduduk/{}", id16(1)), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/users", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, get("/api/progress", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_charts_need_a_token() {
    let (state, _dir) = test_state().await;
    state.auth.bootstrap_admin(ADMIN_PASSWORD).await.unwrap();
    seed(&state).await;
    let app = build_router(state);

    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, body) = send(&app, get("/api/dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["charts"][0].as_str().unwrap().to_string();
    assert!(url.starts_with("/api/dashboard/chart/"));

    let (status, _) = send(&app, get(&url, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(get(&url, Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    // the old public folder is gone
    let (status, _) = send(&app, get("/static/charts/u_admin/chart_agama.png", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let (state, _dir) = test_state().await;
    let form = user_form("kadus1", "kepala_dusun", Some("SATU"), None);
    state.auth.create_user(&admin(), &form).await.unwrap();

    let users = state.auth.list_users(&admin()).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].dusun.as_deref(), Some("SATU"));

    assert!(matches!(
        state.auth.create_user(&admin(), &form).await,
        Err(ServiceError::Conflict(_))
    ));
    assert!(!state.auth.bootstrap_admin(ADMIN_PASSWORD).await.unwrap());
}
