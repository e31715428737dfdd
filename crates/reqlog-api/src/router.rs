//! Route definitions for the demo server.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::logging::RequestLogger;
use crate::state::AppState;

/// Build the demo router with the request logger installed.
pub fn build_router(state: AppState, logger: RequestLogger) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/echo", post(handlers::echo::echo));

    let router = Router::new().nest("/api", api_routes).with_state(state);

    logger.wrap(router).layer(TraceLayer::new_for_http())
}
