//! # AppError
//!
//! Centralized error handling for the threadboard persistence core.
//! Callers match on the variant to pick a response; the store never maps
//! errors to transport status codes itself.

use thiserror::Error;

/// The primary error type for all tb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// The live schema cannot support the operation (missing post table,
    /// missing mandatory column, keyed mutation without a key column).
    /// Not retried.
    #[error("schema configuration error: {0}")]
    Config(String),

    /// Rejected input (blank content, reply on a different post, unknown board)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Resource not found (e.g., Post, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Driver failure that survived the single optional-column retry
    #[error("database error: {0}")]
    Database(String),

    /// Infrastructure failure not covered above
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors caused by caller input rather than by the system.
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

/// A specialized Result type for threadboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
