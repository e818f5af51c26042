//! Error types for jukebox-client
//!
//! Session-level failures are recovered where they occur and never end the
//! session; only startup errors reach `main`.

use thiserror::Error;

/// Main error type for the jukebox client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file or command-line errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shared crate errors (manifest parsing, URL handling)
    #[error(transparent)]
    Common(#[from] jukebox_common::Error),

    /// Manifest request failed (network error or non-success status)
    #[error("Manifest fetch failed: {0}")]
    ManifestFetch(String),

    /// Token reached the head of the queue with no matching asset
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// Streaming connection is not available in this environment
    #[error("Streaming unsupported: {0}")]
    StreamUnsupported(String),

    /// Streaming connection ended
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// HTTP errors while fetching clips
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the client Error
pub type Result<T> = std::result::Result<T, Error>;
