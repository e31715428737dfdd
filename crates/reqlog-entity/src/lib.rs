//! # reqlog-entity
//!
//! Persisted entity models for reqlog. Every struct in this crate
//! represents a stored document or a value embedded in one, and derives
//! `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod log;

pub use log::{ErrorDetails, LogRecord};
