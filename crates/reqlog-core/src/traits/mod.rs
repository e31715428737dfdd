//! Core traits defined in `reqlog-core` and implemented by other crates.

pub mod store;

pub use store::DocumentStore;
