//! Common error types for the matriculas services

use thiserror::Error;

/// Common result type for matriculas operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the matriculas services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Remote fetch failed or answered with a non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// Remote body was not valid JSON or lacked the `data` field
    #[error("Parse error: {0}")]
    Parse(String),

    /// Value too large for a capacity-limited store
    #[error("Value for {key} is {size} bytes, exceeds limit of {limit} bytes")]
    CapacityExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    /// Underlying cache store unavailable or failing
    #[error("Cache backend error: {0}")]
    CacheBackend(String),
}

impl Error {
    /// Fetch failures the gateway absorbs into a `None` result
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Parse(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}
