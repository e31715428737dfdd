//! Axum middleware stack.

pub mod capture;
pub mod logging;
