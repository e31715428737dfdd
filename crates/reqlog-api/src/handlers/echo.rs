//! Echo handler.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// POST /api/echo
///
/// Returns the JSON body it received and records an application log entry
/// through the direct writer.
pub async fn echo(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    state
        .writer
        .log_data(
            &state.app_name,
            Some("debug"),
            "Echo request received",
            Some(json!({ "url": "/api/echo", "requestBody": body.clone() })),
        )
        .await;

    Json(json!({ "echo": body }))
}
