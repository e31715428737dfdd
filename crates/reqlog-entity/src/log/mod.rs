//! Log record entity.

pub mod model;

pub use model::{DEFAULT_LEVEL, ErrorDetails, LogRecord, REQUEST_LOG_MESSAGE, SCHEMA_FIELDS};
