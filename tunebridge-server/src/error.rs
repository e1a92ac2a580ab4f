//! Error types for tunebridge-server
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Catalog and token errors have their own types next to the
//! code that produces them.

use thiserror::Error;

/// Main error type for tunebridge-server
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using tunebridge-server Error
pub type Result<T> = std::result::Result<T, Error>;
