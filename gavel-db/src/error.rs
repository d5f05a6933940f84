//! Error types for store operations

use thiserror::Error;

/// Store error types
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Database path error
    #[error("Database path error: {0}")]
    Path(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, DbError>;
