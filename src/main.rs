//! reqlog server: demo host for the request logging middleware.
//!
//! Loads configuration, connects the log store, and serves the demo routes
//! with every request persisted as a log record.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use reqlog_api::{AppState, RequestLogger, build_router};
use reqlog_core::config::AppConfig;
use reqlog_core::error::AppError;
use reqlog_database::LogStore;
use reqlog_service::{
    ConsoleFormat, ConsoleLogger, LogWriter, console_layer, without_console_target,
};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("REQLOG_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
///
/// With `logging.console_mirror` on, console logger lines keep their own
/// format next to the main one.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let main_layer = match config.logging.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        "console" => fmt::layer().event_format(ConsoleFormat).boxed(),
        _ => fmt::layer().pretty().with_target(true).boxed(),
    };

    let console = config
        .logging
        .console_mirror
        .then(|| console_layer(std::io::stdout));

    tracing_subscriber::registry()
        .with(filter)
        .with(main_layer.with_filter(without_console_target()))
        .with(console)
        .init();
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting reqlog v{}", env!("CARGO_PKG_VERSION"));

    // ── Log store ────────────────────────────────────────────────
    let store = LogStore::connect(&config.database).await?;

    let mut writer = LogWriter::new(Arc::new(store.clone()));
    if config.logging.console_mirror {
        writer = writer.with_console(ConsoleLogger::new());
    }

    // ── Router ───────────────────────────────────────────────────
    let logger = RequestLogger::new(config.app_name.clone(), writer.clone())
        .with_capture_config(config.capture.clone());

    let state = AppState {
        store: Arc::new(store.clone()),
        writer: writer.clone(),
        app_name: Arc::from(config.app_name.as_str()),
    };
    let app = build_router(state, logger);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("reqlog server listening on {}", addr);
    writer
        .log_data(
            &config.app_name,
            Some("info"),
            "Server started",
            Some(json!({ "url": format!("http://{addr}") })),
        )
        .await;

    // ── Graceful shutdown ────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!(pending = writer.pending(), "Draining pending log writes...");
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, writer.drain()).await.is_err() {
        tracing::warn!(
            pending = writer.pending(),
            "Shutdown grace period elapsed with log writes still pending"
        );
    }

    store.shutdown().await;

    tracing::info!("reqlog server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
