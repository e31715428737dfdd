//! Request/response logging middleware.
//!
//! Every request passing through [`request_logging`] yields exactly one
//! persisted [`LogRecord`]: either when the response body finishes, or,
//! when the request cannot be set up (unreadable or oversized body), an
//! error record written before the error response is returned.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{OriginalUri, Request, State};
use axum::middleware::{self as axum_middleware, Next};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::error;

use reqlog_core::config::CaptureConfig;
use reqlog_core::error::AppError;
use reqlog_entity::LogRecord;
use reqlog_service::LogWriter;

use crate::error::ApiError;
use crate::middleware::capture::{
    CapturedBody, ResponseInterceptor, headers_to_json, is_json_content,
};

/// Request logger bound to one application name.
///
/// Cheap to clone; each clone shares the same writer.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    app_name: Arc<str>,
    writer: LogWriter,
    capture: Arc<CaptureConfig>,
}

impl RequestLogger {
    /// Create a logger tagging its records with `app_name`.
    pub fn new(app_name: impl Into<String>, writer: LogWriter) -> Self {
        Self {
            app_name: Arc::from(app_name.into()),
            writer,
            capture: Arc::new(CaptureConfig::default()),
        }
    }

    /// Replace the capture settings.
    pub fn with_capture_config(mut self, capture: CaptureConfig) -> Self {
        self.capture = Arc::new(capture);
        self
    }

    /// Application name stamped on records.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The writer records are persisted through.
    pub fn writer(&self) -> &LogWriter {
        &self.writer
    }

    /// Install this logger as the outermost middleware of `router`.
    pub fn wrap<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(axum_middleware::from_fn_with_state(self, request_logging))
    }

    async fn record_setup_failure(
        &self,
        record: LogRecord,
        start: Instant,
        err: AppError,
    ) -> ApiError {
        let api_error = ApiError(err);
        let status = api_error.status();
        let error_response = ApiError(api_error.0.clone()).into_response();

        let record = record
            .with_response(
                status.as_u16(),
                elapsed_ms(start),
                headers_to_json(error_response.headers(), &self.capture.redact_headers),
                None,
            )
            .with_error(api_error.0.message.clone());

        self.writer.persist_reported(&record).await;

        error!(
            app = %self.app_name,
            method = record.method.as_deref().unwrap_or_default(),
            url = record.url.as_deref().unwrap_or_default(),
            error = %api_error.0,
            "Request failed before reaching the handler"
        );

        api_error
    }
}

/// Logs every request and its response to the document store.
///
/// Install with `axum::middleware::from_fn_with_state(logger, request_logging)`
/// or [`RequestLogger::wrap`].
pub async fn request_logging(
    State(logger): State<RequestLogger>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let url = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    let url = url
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| url.path().to_string());

    let record = LogRecord::request(&*logger.app_name, parts.method.as_str(), url);
    let request_headers = headers_to_json(&parts.headers, &logger.capture.redact_headers);

    let bytes = match read_body(body, logger.capture.max_request_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let record = record.with_request(None, request_headers);
            return Err(logger.record_setup_failure(record, start, err).await);
        }
    };

    let request_body = CapturedBody::from_bytes(
        &bytes,
        is_json_content(&parts.headers),
        logger.capture.max_body_bytes,
    )
    .into_value();
    let record = record.with_request(request_body, request_headers);

    let writer = logger.writer.clone();
    let capture = Arc::clone(&logger.capture);
    let interceptor = ResponseInterceptor::new(capture.max_body_bytes)
        .force_json_content_type(capture.force_json_content_type)
        .on_body_captured(move |captured| {
            let record = record.with_response(
                captured.status.as_u16(),
                elapsed_ms(start),
                headers_to_json(&captured.headers, &capture.redact_headers),
                captured.body.into_value(),
            );
            writer.persist_in_background(record);
        });

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    Ok(interceptor.intercept(response))
}

/// Buffer the request body so it can be both recorded and forwarded.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, AppError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(
            AppError::payload_too_large(format!("Request body exceeds {limit} bytes")),
        ),
        Err(e) => Err(AppError::validation(format!(
            "Failed to read request body: {e}"
        ))),
    }
}

fn elapsed_ms(start: Instant) -> i64 {
    i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX)
}
