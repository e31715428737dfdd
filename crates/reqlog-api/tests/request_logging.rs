//! Integration tests for the request logging middleware.

use std::io;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::{get, post};
use futures::stream;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use reqlog_api::RequestLogger;
use reqlog_core::config::CaptureConfig;
use reqlog_database::repositories::MemoryLogRepository;
use reqlog_entity::LogRecord;
use reqlog_service::LogWriter;

/// Test application context
struct TestApp {
    router: Router,
    store: MemoryLogRepository,
    writer: LogWriter,
}

/// Response as the client saw it
struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

fn routes() -> Router {
    Router::new()
        .route("/users", get(|| async { Json(json!({"users": ["ada", "grace"]})) }))
        .route("/text", get(|| async { "plain text" }))
        .route(
            "/orders",
            post(|Json(order): Json<Value>| async move {
                (StatusCode::CREATED, Json(json!({"id": 42, "order": order})))
            }),
        )
        .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
}

impl TestApp {
    fn new(app_name: &str) -> Self {
        Self::with_capture(app_name, CaptureConfig::default())
    }

    fn with_capture(app_name: &str, capture: CaptureConfig) -> Self {
        let store = MemoryLogRepository::new();
        let writer = LogWriter::new(Arc::new(store.clone()));
        let logger = RequestLogger::new(app_name, writer.clone()).with_capture_config(capture);

        Self {
            router: logger.wrap(routes()),
            store,
            writer,
        }
    }

    /// Send a request, read the whole body, and wait for pending log writes.
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        self.writer.drain().await;

        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn records(&self) -> Vec<LogRecord> {
        self.store.records().await
    }
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_completed_request_persists_one_record() {
    let app = TestApp::new("svc");

    let response = app.send(get_request("/users?page=2")).await;
    assert_eq!(response.status, StatusCode::OK);

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.app_name, "svc");
    assert_eq!(record.level, "info");
    assert_eq!(record.message, "API Logs");
    assert_eq!(record.method.as_deref(), Some("GET"));
    assert_eq!(record.url.as_deref(), Some("/users?page=2"));
    assert_eq!(record.status_code, Some(200));
    assert!(record.response_time.unwrap() >= 0);
    assert_eq!(
        record.response_body,
        Some(json!({"users": ["ada", "grace"]}))
    );
    assert!(record.error.is_none());
    assert!(record.request_body.is_none());
}

#[tokio::test]
async fn test_request_body_and_status_are_recorded() {
    let app = TestApp::new("svc");

    let response = app
        .send(json_request("/orders", json!({"sku": "A-1", "qty": 3})))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.status_code, Some(201));
    assert_eq!(record.request_body, Some(json!({"sku": "A-1", "qty": 3})));
    assert_eq!(
        record.request_headers.as_ref().unwrap()["content-type"],
        "application/json"
    );
    assert_eq!(record.response_body.as_ref().unwrap()["id"], 42);
    assert_eq!(
        record.response_headers.as_ref().unwrap()["content-type"],
        "application/json"
    );
}

#[tokio::test]
async fn test_interception_is_transparent_to_client() {
    let app = TestApp::new("svc");
    let bare = routes();

    for uri in ["/users", "/text"] {
        let logged = app.send(get_request(uri)).await;

        let direct = bare.clone().oneshot(get_request(uri)).await.unwrap();
        let direct_status = direct.status();
        let direct_body = direct.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(logged.status, direct_status);
        assert_eq!(logged.body, direct_body);
    }
}

#[tokio::test]
async fn test_content_type_forced_to_json() {
    let app = TestApp::new("svc");

    let response = app.send(get_request("/text")).await;

    assert_eq!(response.headers[CONTENT_TYPE], "application/json");
    assert_eq!(&response.body[..], b"plain text");

    let records = app.records().await;
    assert_eq!(records[0].response_body, Some(json!("plain text")));
}

#[tokio::test]
async fn test_empty_response_is_logged_without_body() {
    let app = TestApp::new("svc");

    let response = app.send(get_request("/empty")).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status_code, Some(204));
    assert!(records[0].response_body.is_none());
}

#[tokio::test]
async fn test_unmatched_route_is_logged() {
    let app = TestApp::new("svc");

    let response = app.send(get_request("/nope")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status_code, Some(404));
    assert_eq!(records[0].url.as_deref(), Some("/nope"));
}

#[tokio::test]
async fn test_unreadable_request_body_logs_error_and_forwards_it() {
    let app = TestApp::new("svc");
    let broken = stream::iter(vec![Err::<Bytes, io::Error>(io::Error::other(
        "connection reset",
    ))]);
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from_stream(broken))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    let error = record.error.as_ref().expect("error details recorded");
    assert!(error.message.contains("Failed to read request body"));
    assert_eq!(record.status_code, Some(400));
    assert!(record.response_time.unwrap() >= 0);
    assert_eq!(record.method.as_deref(), Some("POST"));
}

#[tokio::test]
async fn test_oversized_request_body_is_rejected_and_logged() {
    let capture = CaptureConfig {
        max_request_body_bytes: 8,
        ..CaptureConfig::default()
    };
    let app = TestApp::with_capture("svc", capture);

    let response = app
        .send(json_request("/orders", json!({"sku": "far too long"})))
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status_code, Some(413));
    assert!(records[0].error.is_some());
}

#[tokio::test]
async fn test_setup_failure_during_store_outage_still_answers() {
    let app = TestApp::new("svc");
    app.store.set_available(false);
    let broken = stream::iter(vec![Err::<Bytes, io::Error>(io::Error::other(
        "connection reset",
    ))]);
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .body(Body::from_stream(broken))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.records().await.is_empty());
}

#[tokio::test]
async fn test_separate_loggers_tag_records_independently() {
    let store = MemoryLogRepository::new();
    let writer = LogWriter::new(Arc::new(store.clone()));
    let billing = RequestLogger::new("billing", writer.clone()).wrap(routes());
    let search = RequestLogger::new("search", writer.clone()).wrap(routes());

    for router in [&billing, &search] {
        let response = router.clone().oneshot(get_request("/users")).await.unwrap();
        response.into_body().collect().await.unwrap();
    }
    writer.drain().await;

    let mut names: Vec<String> = store
        .records()
        .await
        .into_iter()
        .map(|r| r.app_name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["billing", "search"]);
}

#[tokio::test]
async fn test_store_outage_does_not_affect_responses() {
    let app = TestApp::new("svc");
    app.store.set_available(false);

    let response = app.send(get_request("/users")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(app.records().await.is_empty());

    app.store.set_available(true);
    app.send(get_request("/users")).await;
    assert_eq!(app.records().await.len(), 1);
}

#[tokio::test]
async fn test_capture_limits_and_redaction() {
    let capture = CaptureConfig {
        max_body_bytes: 4,
        redact_headers: vec!["authorization".to_string()],
        ..CaptureConfig::default()
    };
    let app = TestApp::with_capture("svc", capture);

    let request = Request::builder()
        .uri("/users")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    let expected_len = response.body.len();
    let records = app.records().await;
    let record = &records[0];
    assert_eq!(
        record.response_body,
        Some(json!(format!("[{expected_len} bytes]")))
    );
    assert_eq!(
        record.request_headers.as_ref().unwrap()["authorization"],
        "[REDACTED]"
    );
}
