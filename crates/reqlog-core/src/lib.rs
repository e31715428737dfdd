//! # reqlog-core
//!
//! Core crate for reqlog. Contains the document store trait, configuration
//! schemas, and the unified error system.
//!
//! This crate has **no** internal dependencies on other reqlog crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
