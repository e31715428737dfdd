//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod capture;
pub mod database;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::capture::CaptureConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `REQLOG__*` variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logical application name stamped on every request log record.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Request/response capture settings.
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default`, an environment-specific overlay
    /// `config/{env}`, and environment variables prefixed with `REQLOG__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("REQLOG")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

fn default_app_name() -> String {
    "reqlog".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sources_fall_back_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.app_name, "reqlog");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.provider, "mongodb");
        assert_eq!(config.database.collection, "logs");
        assert_eq!(config.logging.level, "info");
        assert!(config.capture.force_json_content_type);
    }

    #[test]
    fn test_default_matches_empty_sources() {
        let config = AppConfig::default();
        assert_eq!(config.app_name, "reqlog");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.collection, "logs");
    }

    #[test]
    fn test_toml_overrides_nested_sections() {
        let toml = r#"
            app_name = "billing"

            [database]
            provider = "memory"
            url = "mongodb://db.internal:27017/audit"

            [capture]
            max_body_bytes = 16
            redact_headers = ["authorization"]
        "#;

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.app_name, "billing");
        assert_eq!(config.database.provider, "memory");
        assert_eq!(config.database.url, "mongodb://db.internal:27017/audit");
        assert_eq!(config.capture.max_body_bytes, 16);
        assert_eq!(config.capture.redact_headers, vec!["authorization"]);
        assert_eq!(config.logging.format, "pretty");
    }
}
