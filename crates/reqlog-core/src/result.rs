//! Convenience result type alias for reqlog.

use crate::error::AppError;

/// A specialized `Result` type for reqlog operations.
pub type AppResult<T> = Result<T, AppError>;
