//! Document store configuration.

use serde::{Deserialize, Serialize};

/// Document store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store provider: `"mongodb"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// MongoDB connection URI.
    #[serde(default = "default_url")]
    pub url: String,
    /// Database name. Falls back to the URI's default database, then `"logs"`.
    #[serde(default)]
    pub name: Option<String>,
    /// Collection holding log records.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Application name reported to the MongoDB server.
    #[serde(default)]
    pub client_app_name: Option<String>,
    /// TCP connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Server selection timeout in milliseconds.
    #[serde(default = "default_server_selection_timeout")]
    pub server_selection_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Build a MongoDB configuration for the given URI with default settings.
    pub fn mongodb(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: default_url(),
            name: None,
            collection: default_collection(),
            client_app_name: None,
            connect_timeout_ms: default_connect_timeout(),
            server_selection_timeout_ms: default_server_selection_timeout(),
        }
    }
}

fn default_provider() -> String {
    "mongodb".to_string()
}

fn default_url() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_collection() -> String {
    "logs".to_string()
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_server_selection_timeout() -> u64 {
    30_000
}
