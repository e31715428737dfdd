//! Log record persistence: background writes and the direct log writer.

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use reqlog_core::error::AppError;
use reqlog_core::result::AppResult;
use reqlog_core::traits::DocumentStore;
use reqlog_entity::LogRecord;

use crate::console::ConsoleLogger;

/// Persists log records through the injected store.
///
/// Every write is a single attempt. Outcomes are reported through `tracing`
/// (and the console logger when mirroring is enabled); background write
/// failures go through the same failure report and never escape the task.
#[derive(Debug, Clone)]
pub struct LogWriter {
    /// Store records are inserted into.
    store: Arc<dyn DocumentStore<LogRecord>>,
    /// In-flight background writes.
    tasks: TaskTracker,
    /// Mirror for persisted outcomes.
    console: Option<ConsoleLogger>,
}

impl LogWriter {
    /// Create a writer for the given store.
    pub fn new(store: Arc<dyn DocumentStore<LogRecord>>) -> Self {
        Self {
            store,
            tasks: TaskTracker::new(),
            console: None,
        }
    }

    /// Mirror every persistence outcome to the console logger.
    pub fn with_console(mut self, console: ConsoleLogger) -> Self {
        self.console = Some(console);
        self
    }

    /// Insert one record, awaiting the store.
    ///
    /// The outcome is reported either way; the error is also returned.
    pub async fn persist(&self, record: &LogRecord) -> AppResult<()> {
        match self.store.insert(record).await {
            Ok(()) => {
                self.report_persisted(record);
                Ok(())
            }
            Err(e) => {
                self.report_failure(record, &e);
                Err(e)
            }
        }
    }

    /// Insert one record, awaiting the store.
    ///
    /// A failure is reported and not returned.
    pub async fn persist_reported(&self, record: &LogRecord) {
        if let Err(e) = self.persist(record).await {
            debug!(error = %e, "Log record dropped after failure report");
        }
    }

    /// Insert one record on a tracked background task.
    ///
    /// Returns immediately. Failures are reported, never propagated.
    /// Outside a Tokio runtime the record cannot be written and is reported
    /// as lost.
    pub fn persist_in_background(&self, record: LogRecord) {
        let Ok(handle) = Handle::try_current() else {
            let err = AppError::internal("No async runtime available for log write");
            self.report_failure(&record, &err);
            return;
        };

        let writer = self.clone();
        self.tasks.spawn_on(
            async move {
                writer.persist_reported(&record).await;
            },
            &handle,
        );
    }

    /// Persist an application log entry outside the request cycle.
    ///
    /// `level` defaults to `"info"`. Fields in `meta` naming stored fields
    /// override them; other keys are dropped. Failures are reported and
    /// swallowed: the caller never observes them.
    pub async fn log_data(
        &self,
        app_name: &str,
        level: Option<&str>,
        message: &str,
        meta: Option<Value>,
    ) {
        let record = LogRecord::application(app_name, level, message);
        let record = match meta {
            None => Ok(record),
            Some(Value::Object(fields)) => record.with_meta(fields),
            Some(_) => Err(AppError::validation("Log meta must be a JSON object")),
        };

        match record {
            Ok(record) => self.persist_reported(&record).await,
            Err(e) => error!(app = %app_name, error = %e, "Error saving log"),
        }
    }

    /// Wait until every background write started so far has finished.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Number of background writes still running.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    fn report_persisted(&self, record: &LogRecord) {
        if record.is_request_originated() {
            info!(
                app = %record.app_name,
                method = record.method.as_deref().unwrap_or_default(),
                url = record.url.as_deref().unwrap_or_default(),
                status = record.status_code.unwrap_or_default(),
                response_time_ms = record.response_time.unwrap_or_default(),
                "Request log persisted"
            );
        } else {
            info!(
                app = %record.app_name,
                "[{}] {}",
                record.level.to_uppercase(),
                record.message
            );
        }

        if let Some(console) = &self.console {
            console.log(&record.level, &summarize(record));
        }
    }

    fn report_failure(&self, record: &LogRecord, err: &AppError) {
        error!(
            app = %record.app_name,
            level = %record.level,
            url = record.url.as_deref().unwrap_or_default(),
            error = %err,
            "Failed to persist log record"
        );

        if let Some(console) = &self.console {
            console.error(&format!("Failed to persist log record: {err}"));
        }
    }
}

/// One-line description of a record for the console.
fn summarize(record: &LogRecord) -> String {
    match (&record.method, &record.url) {
        (Some(method), Some(url)) => {
            let mut line = format!(
                "{} {} {} - {}ms",
                method,
                url,
                record.status_code.unwrap_or_default(),
                record.response_time.unwrap_or_default()
            );
            if let Some(error) = &record.error {
                line.push_str(&format!(" ({})", error.message));
            }
            line
        }
        _ => record.message.clone(),
    }
}
