//! Log record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use reqlog_core::error::AppError;
use reqlog_core::result::AppResult;

/// Level used when the caller does not supply one.
pub const DEFAULT_LEVEL: &str = "info";

/// Message stamped on every request-originated record.
pub const REQUEST_LOG_MESSAGE: &str = "API Logs";

/// Stored field names. Meta keys outside this list are dropped.
pub const SCHEMA_FIELDS: &[&str] = &[
    "appName",
    "level",
    "message",
    "timestamp",
    "method",
    "url",
    "statusCode",
    "responseTime",
    "requestBody",
    "requestHeaders",
    "responseBody",
    "responseHeaders",
    "error",
];

/// One log entry, written once and never mutated after persistence.
///
/// A record is either request-originated (built by the request logger, with
/// method, URL, status code and response time) or application-originated
/// (built by the direct log writer, without them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Logical application identifier.
    #[validate(length(min = 1, message = "appName is required"))]
    pub app_name: String,
    /// Severity label (`"info"`, `"error"`, ...). Free-form.
    #[validate(length(min = 1, message = "level is required"))]
    pub level: String,
    /// Human-readable summary.
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    /// When the record was created.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Request method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Original request URL (path and query).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Final response status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Milliseconds between request entry and response completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<i64>,
    /// Captured request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Captured request headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Value>,
    /// Captured response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    /// Captured response headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Value>,
    /// Present only when the request pipeline failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error information attached to a failed request record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// The error's message.
    pub message: String,
}

impl LogRecord {
    /// Create a record with the required fields, timestamped now.
    pub fn new(
        app_name: impl Into<String>,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            level: level.into(),
            message: message.into(),
            timestamp: Utc::now(),
            method: None,
            url: None,
            status_code: None,
            response_time: None,
            request_body: None,
            request_headers: None,
            response_body: None,
            response_headers: None,
            error: None,
        }
    }

    /// Create an application-originated record. `level` defaults to `"info"`.
    pub fn application(
        app_name: impl Into<String>,
        level: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(app_name, level.unwrap_or(DEFAULT_LEVEL), message)
    }

    /// Create the initial field set of a request-originated record.
    pub fn request(
        app_name: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(app_name, DEFAULT_LEVEL, REQUEST_LOG_MESSAGE);
        record.method = Some(method.into());
        record.url = Some(url.into());
        record
    }

    /// Attach the captured request payload.
    pub fn with_request(mut self, body: Option<Value>, headers: Value) -> Self {
        self.request_body = body;
        self.request_headers = Some(headers);
        self
    }

    /// Attach the response outcome.
    pub fn with_response(
        mut self,
        status_code: u16,
        response_time_ms: i64,
        headers: Value,
        body: Option<Value>,
    ) -> Self {
        self.status_code = Some(status_code);
        self.response_time = Some(response_time_ms.max(0));
        self.response_headers = Some(headers);
        self.response_body = body;
        self
    }

    /// Mark the record as describing a failed request.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            message: message.into(),
        });
        self
    }

    /// Merge arbitrary extra fields into the record.
    ///
    /// Keys naming a stored field override it; other keys are dropped.
    /// A value of the wrong type for its field is a validation error.
    pub fn with_meta(self, meta: Map<String, Value>) -> AppResult<Self> {
        if meta.is_empty() {
            return Ok(self);
        }

        let Value::Object(mut fields) = serde_json::to_value(&self)? else {
            return Err(AppError::internal("log record did not serialize to an object"));
        };

        for (key, value) in meta {
            if SCHEMA_FIELDS.contains(&key.as_str()) {
                fields.insert(key, value);
            }
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::validation(format!("Invalid log meta: {e}")))
    }

    /// Check that the required fields are present.
    pub fn ensure_valid(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid log record: {e}")))
    }

    /// Whether this record was produced by the request logger.
    pub fn is_request_originated(&self) -> bool {
        self.method.is_some() && self.url.is_some()
    }
}
