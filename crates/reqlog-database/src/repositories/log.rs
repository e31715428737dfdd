//! MongoDB-backed log record repository.

use async_trait::async_trait;
use mongodb::Collection;
use mongodb::bson::{self, Bson, Document};
use serde_json::Value;

use reqlog_core::error::{AppError, ErrorKind};
use reqlog_core::result::AppResult;
use reqlog_core::traits::DocumentStore;
use reqlog_entity::LogRecord;

use crate::connection::MongoConnection;

/// Inserts log records into the configured MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoLogRepository {
    collection: Collection<Document>,
    connection: MongoConnection,
}

impl MongoLogRepository {
    /// Create a repository writing through the given connection.
    pub fn new(connection: MongoConnection) -> Self {
        Self {
            collection: connection.log_collection(),
            connection,
        }
    }

    /// The connection this repository writes through.
    pub fn connection(&self) -> &MongoConnection {
        &self.connection
    }
}

/// Convert a record to its stored document form.
///
/// The timestamp is stored as a BSON date rather than a string. Captured
/// payloads are arbitrary JSON, so values BSON cannot hold are widened
/// instead of failing the whole record (see [`json_to_bson`]).
pub(crate) fn to_document(record: &LogRecord) -> AppResult<Document> {
    let mut document = match serde_json::to_value(record)? {
        Value::Object(fields) => fields
            .into_iter()
            .map(|(key, value)| (key, json_to_bson(value)))
            .collect::<Document>(),
        other => {
            return Err(AppError::new(
                ErrorKind::Serialization,
                format!("Failed to encode log record: expected an object, got {other}"),
            ));
        }
    };
    document.insert(
        "timestamp",
        bson::DateTime::from_millis(record.timestamp.timestamp_millis()),
    );
    Ok(document)
}

/// Convert a JSON value to BSON.
///
/// BSON has no unsigned 64-bit integer: integers above `i64::MAX` are stored
/// as doubles.
fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Bson::Int64(i),
            (None, Some(f)) => Bson::Double(f),
            (None, None) => Bson::String(n.to_string()),
        },
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(fields) => Bson::Document(
            fields
                .into_iter()
                .map(|(key, value)| (key, json_to_bson(value)))
                .collect(),
        ),
    }
}

#[async_trait]
impl DocumentStore<LogRecord> for MongoLogRepository {
    async fn insert(&self, record: &LogRecord) -> AppResult<()> {
        record.ensure_valid()?;
        let document = to_document(record)?;

        self.collection.insert_one(document).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to insert log record: {e}"),
                e,
            )
        })?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.connection.health_check().await
    }
}
