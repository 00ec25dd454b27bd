//! Error types for PaperDesk
//!
//! Provides:
//! - Distinct error types for the failure modes the core can hit
//! - A crate-wide `Result` alias
//!
//! Conflicts and lookup misses are recovered at the `Store` boundary and
//! surfaced to callers as `None`/`false`; a failing source adapter is treated
//! as an empty result for that source; analysis and chat convert internal
//! failures into fixed degraded responses. No error here is fatal.

use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Uniqueness violation on create/update
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Lookup miss
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// A single paper source adapter failed
    #[error("Source '{source_name}' failed: {message}")]
    SourceFailure {
        source_name: String,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for a lookup miss
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        AppError::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Shorthand for an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }

    /// True when the error is a uniqueness conflict, either detected by the
    /// store itself or reported by SQLite.
    pub fn is_conflict(&self) -> bool {
        match self {
            AppError::Conflict { .. } => true,
            AppError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
