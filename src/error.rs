//! Error types for the loans crate

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
