//! MongoDB connection management.

use std::time::Duration;

use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tracing::{error, info};

use reqlog_core::config::DatabaseConfig;
use reqlog_core::error::{AppError, ErrorKind};
use reqlog_core::result::AppResult;

/// Database used when neither the config nor the URI names one.
const DEFAULT_DATABASE: &str = "logs";

/// An established connection to the MongoDB deployment holding log records.
///
/// The underlying client is internally pooled and cheap to clone; one
/// connection is created at startup and injected wherever writes happen.
#[derive(Debug, Clone)]
pub struct MongoConnection {
    client: Client,
    database: Database,
    collection: String,
}

impl MongoConnection {
    /// Connect to MongoDB and verify the deployment answers a `ping`.
    ///
    /// Failures are logged and returned so startup can decide whether to
    /// abort.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        info!(url = %mask_password(&config.url), "Connecting to MongoDB");

        match Self::establish(config).await {
            Ok(connection) => {
                info!(
                    database = %connection.database.name(),
                    collection = %connection.collection,
                    "MongoDB connected"
                );
                Ok(connection)
            }
            Err(e) => {
                error!(error = %e, "MongoDB connection error");
                Err(e)
            }
        }
    }

    async fn establish(config: &DatabaseConfig) -> AppResult<Self> {
        let mut options = ClientOptions::parse(config.url.as_str())
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Invalid MongoDB connection string: {e}"),
                    e,
                )
            })?;

        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));
        if let Some(app_name) = &config.client_app_name {
            options.app_name = Some(app_name.clone());
        }

        let database_name = config
            .name
            .clone()
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(options).map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to create MongoDB client: {e}"),
                e,
            )
        })?;

        let database = client.database(&database_name);
        database.run_command(doc! { "ping": 1 }).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to connect to MongoDB: {e}"),
                e,
            )
        })?;

        Ok(Self {
            client,
            database,
            collection: config.collection.clone(),
        })
    }

    /// The database log records are written to.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The collection log records are written to.
    pub fn log_collection(&self) -> Collection<Document> {
        self.database.collection(&self.collection)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| true)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close all pooled connections.
    pub async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        info!("MongoDB connection closed");
    }
}

/// Connect to the MongoDB deployment at `uri` with default settings.
pub async fn connect_mongodb(uri: &str) -> AppResult<MongoConnection> {
    MongoConnection::connect(&DatabaseConfig::mongodb(uri)).await
}

/// Mask the password portion of a connection URI for safe logging.
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
