//! Common error types for the jukebox crates

use thiserror::Error;

/// Common result type for jukebox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by client and server
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest could not be parsed
    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Malformed URL in configuration or manifest
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
