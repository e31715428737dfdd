//! # reqlog-api
//!
//! HTTP layer for reqlog built on Axum.
//!
//! Provides the request-logging middleware and its response interceptor,
//! the `AppError` to HTTP response mapping, and the demo routes served by
//! `reqlog-server`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use middleware::capture::{CapturedBody, CapturedResponse, ResponseInterceptor};
pub use middleware::logging::{RequestLogger, request_logging};
pub use router::build_router;
pub use state::AppState;
