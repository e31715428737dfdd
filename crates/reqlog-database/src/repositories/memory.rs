//! In-memory log record store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use reqlog_core::error::AppError;
use reqlog_core::result::AppResult;
use reqlog_core::traits::DocumentStore;
use reqlog_entity::LogRecord;

/// Keeps log records in process memory.
///
/// Useful for local development without a MongoDB deployment and for
/// tests. The store can be marked unavailable to exercise outage handling.
#[derive(Debug, Clone)]
pub struct MemoryLogRepository {
    records: Arc<Mutex<Vec<LogRecord>>>,
    available: Arc<AtomicBool>,
}

impl MemoryLogRepository {
    /// Create an empty, available store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Snapshot of every record written so far, in insertion order.
    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.lock().await.clone()
    }

    /// Number of records written so far.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether no record has been written.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Make subsequent writes succeed or fail.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for MemoryLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore<LogRecord> for MemoryLogRepository {
    async fn insert(&self, record: &LogRecord) -> AppResult<()> {
        record.ensure_valid()?;
        if !self.available.load(Ordering::SeqCst) {
            return Err(AppError::database("In-memory log store is unavailable"));
        }
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqlog_core::error::ErrorKind;

    #[tokio::test]
    async fn test_insert_appends_in_order() {
        let store = MemoryLogRepository::new();
        store.insert(&LogRecord::new("svc", "info", "first")).await.unwrap();
        store.insert(&LogRecord::new("svc", "warn", "second")).await.unwrap();

        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].level, "warn");
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_writes() {
        let store = MemoryLogRepository::new();
        store.set_available(false);

        let err = store
            .insert(&LogRecord::new("svc", "info", "lost"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(store.is_empty().await);
        assert!(!store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_record_is_not_written() {
        let store = MemoryLogRepository::new();
        let err = store
            .insert(&LogRecord::new("svc", "", "no level"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.len().await, 0);
    }
}
