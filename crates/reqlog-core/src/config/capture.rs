//! Request/response capture configuration.

use serde::{Deserialize, Serialize};

/// Controls what the request logger records from each exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Bodies larger than this are recorded as a `"[<n> bytes]"` placeholder.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Request bodies larger than this are rejected before the handler runs.
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
    /// Rewrite the response `Content-Type` to `application/json`.
    #[serde(default = "default_true")]
    pub force_json_content_type: bool,
    /// Header names whose values are stored as `"[REDACTED]"`.
    #[serde(default)]
    pub redact_headers: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            max_request_body_bytes: default_max_request_body_bytes(),
            force_json_content_type: true,
            redact_headers: Vec::new(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_max_request_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_true() -> bool {
    true
}
