//! Error types for the framepump library.

use thiserror::Error;

/// Main error type for the framepump library.
#[derive(Error, Debug)]
pub enum Error {
    /// An unsupported property/value combination, rejected at setup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transform engine failed irrecoverably.
    #[error("Engine error: {0}")]
    Engine(String),

    /// I/O errors from sources and sinks.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unsupported feature or format.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an engine error.
    pub fn engine(msg: impl Into<String>) -> Self {
        Error::Engine(msg.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Check if this error originated in the transform engine.
    #[must_use]
    pub fn is_engine(&self) -> bool {
        matches!(self, Error::Engine(_))
    }
}
