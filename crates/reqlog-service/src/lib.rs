//! # reqlog-service
//!
//! Log persistence services. The [`LogWriter`] owns the store handle and the
//! background tasks that insert records; the [`ConsoleLogger`] mirrors
//! outcomes as `timestamp [level]: message` lines.
//!
//! Services follow constructor injection: the store is provided at
//! construction time via an `Arc`.

pub mod console;
pub mod writer;

pub use console::{ConsoleFormat, ConsoleLogger, console_layer, without_console_target};
pub use writer::LogWriter;
