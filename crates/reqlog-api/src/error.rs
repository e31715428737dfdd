//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use reqlog_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// An [`AppError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Status code this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self.0.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Database => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal | ErrorKind::Configuration | ErrorKind::Serialization => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self.0.kind {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorKind::Database => "SERVICE_UNAVAILABLE",
            ErrorKind::Internal | ErrorKind::Configuration | ErrorKind::Serialization => {
                "INTERNAL_ERROR"
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Internal server error");
        }

        let body = ApiErrorResponse {
            error: self.code().to_string(),
            message: self.0.message,
        };

        (status, Json(body)).into_response()
    }
}
