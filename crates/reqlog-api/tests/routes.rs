//! Demo routes served behind the request logger.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use reqlog_api::{AppState, RequestLogger, build_router};
use reqlog_database::repositories::MemoryLogRepository;
use reqlog_service::LogWriter;

fn app(store: &MemoryLogRepository) -> (axum::Router, LogWriter) {
    let writer = LogWriter::new(Arc::new(store.clone()));
    let state = AppState {
        store: Arc::new(store.clone()),
        writer: writer.clone(),
        app_name: Arc::from("demo"),
    };
    let router = build_router(state, RequestLogger::new("demo", writer.clone()));
    (router, writer)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_store_and_is_logged() {
    let store = MemoryLogRepository::new();
    let (router, writer) = app(&store);

    let response = router
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "connected");

    writer.drain().await;
    let records = store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url.as_deref(), Some("/api/health"));
    assert_eq!(records[0].app_name, "demo");
}

#[tokio::test]
async fn test_health_reports_unavailable_store() {
    let store = MemoryLogRepository::new();
    store.set_available(false);
    let (router, _writer) = app(&store);

    let response = router
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["store"], "unavailable");
}

#[tokio::test]
async fn test_echo_writes_application_and_request_records() {
    let store = MemoryLogRepository::new();
    let (router, writer) = app(&store);

    let response = router
        .oneshot(
            Request::post("/api/echo")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"ping": 1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"echo": {"ping": 1}}));

    writer.drain().await;
    let records = store.records().await;
    assert_eq!(records.len(), 2);

    let direct = records.iter().find(|r| r.level == "debug").unwrap();
    assert_eq!(direct.message, "Echo request received");
    assert_eq!(direct.request_body, Some(json!({"ping": 1})));

    let request = records.iter().find(|r| r.is_request_originated()).unwrap();
    assert_eq!(request.method.as_deref(), Some("POST"));
    assert_eq!(request.status_code, Some(200));
    assert_eq!(request.response_body, Some(json!({"echo": {"ping": 1}})));
}
