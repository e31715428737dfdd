//! Shared state for the demo routes.

use std::sync::Arc;

use reqlog_core::traits::DocumentStore;
use reqlog_entity::LogRecord;
use reqlog_service::LogWriter;

/// State threaded through the demo handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Store the request logger writes to; probed by the health endpoint.
    pub store: Arc<dyn DocumentStore<LogRecord>>,
    /// Writer shared with the request logger.
    pub writer: LogWriter,
    /// Application name used for direct log entries.
    pub app_name: Arc<str>,
}
