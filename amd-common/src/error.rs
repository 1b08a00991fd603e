//! Common error types for AMD services

use thiserror::Error;

/// Common result type for AMD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across AMD services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
