//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// The file as a whole could not be read as a table
    #[error("Parse error: {0}")]
    Parse(String),

    /// One or more user-correctable problems, reported together
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Shorthand for a validation failure with a single message
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Validation(vec![msg.into()])
    }
}

pub type Result<T> = std::result::Result<T, Error>;
