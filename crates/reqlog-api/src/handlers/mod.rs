//! Demo route handlers.

pub mod echo;
pub mod health;
