//! Health check handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"` when the log store answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Log store reachability.
    pub store: String,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let reachable = state.store.health_check().await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if reachable { "connected" } else { "unavailable" }.to_string(),
    }))
}
