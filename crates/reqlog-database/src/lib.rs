//! # reqlog-database
//!
//! MongoDB connection management and the log record stores
//! (MongoDB-backed and in-memory).

pub mod connection;
pub mod provider;
pub mod repositories;

pub use connection::{MongoConnection, connect_mongodb};
pub use provider::LogStore;
