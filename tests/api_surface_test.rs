//! HTTP surface checks: the shared response envelope, the error body shape,
//! and the acting-principal header requirement.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::TestApp;
use retail_api::{api_v1_routes, config::AppConfig, events, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "development".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: false,
        request_timeout_secs: 30,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 5,
    }
}

async fn test_router(app: &TestApp) -> Router {
    let (event_sender, _rx) = events::channel(64);
    let state = AppState {
        db: app.db.clone(),
        config: test_config(),
        event_sender,
        services: app.services.clone(),
    };
    Router::new().nest("/api/v1", api_v1_routes()).with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn status_endpoint_uses_the_success_envelope() {
    let app = TestApp::new().await;
    let router = test_router(&app).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["service"], json!("retail-api"));
}

#[tokio::test]
async fn mutations_without_the_actor_header_are_unauthorized() {
    let app = TestApp::new().await;
    let router = test_router(&app).await;

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/customers")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"name": "Anh", "phone": "0911222333"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Unauthorized"));
}

#[tokio::test]
async fn mutations_with_the_actor_header_succeed() {
    let app = TestApp::new().await;
    let router = test_router(&app).await;

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/customers")
                .header("content-type", "application/json")
                .header("x-actor-name", "admin")
                .body(Body::from(
                    json!({"name": "Anh", "phone": "0911222333"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["name"], json!("Anh"));
}

#[tokio::test]
async fn not_found_errors_share_the_error_body_shape() {
    let app = TestApp::new().await;
    let router = test_router(&app).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/orders/{}",
                    uuid::Uuid::new_v4()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Not Found"));
    assert!(body["message"].as_str().unwrap().contains("not found"));
    assert!(body["timestamp"].is_string());
}
