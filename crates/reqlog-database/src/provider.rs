//! Log store that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use reqlog_core::config::DatabaseConfig;
use reqlog_core::error::AppError;
use reqlog_core::result::AppResult;
use reqlog_core::traits::DocumentStore;
use reqlog_entity::LogRecord;

use crate::connection::MongoConnection;
use crate::repositories::{MemoryLogRepository, MongoLogRepository};

/// Log store wrapping the configured backend.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct LogStore {
    inner: Arc<dyn DocumentStore<LogRecord>>,
    connection: Option<MongoConnection>,
}

impl LogStore {
    /// Create a log store from configuration, connecting if required.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "mongodb" => {
                let connection = MongoConnection::connect(config).await?;
                let repository = MongoLogRepository::new(connection.clone());
                Ok(Self {
                    inner: Arc::new(repository),
                    connection: Some(connection),
                })
            }
            "memory" => {
                info!("Initializing in-memory log store");
                Ok(Self::from_provider(Arc::new(MemoryLogRepository::new())))
            }
            other => Err(AppError::configuration(format!(
                "Unknown log store provider: '{other}'. Supported: mongodb, memory"
            ))),
        }
    }

    /// Create a log store from an existing provider.
    pub fn from_provider(provider: Arc<dyn DocumentStore<LogRecord>>) -> Self {
        Self {
            inner: provider,
            connection: None,
        }
    }

    /// Release the backing connection, if any.
    pub async fn shutdown(&self) {
        if let Some(connection) = &self.connection {
            connection.shutdown().await;
        }
    }
}

#[async_trait]
impl DocumentStore<LogRecord> for LogStore {
    async fn insert(&self, record: &LogRecord) -> AppResult<()> {
        self.inner.insert(record).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
