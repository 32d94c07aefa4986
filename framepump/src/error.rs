//! Pump error types.

use framepump_core::error::Error as CoreError;
use thiserror::Error;

/// Pump error type.
#[derive(Error, Debug)]
pub enum PumpError {
    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// IO error from a source or sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration, rejected before the loop starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine entered its error state mid-run. Fatal; never retried.
    #[error("Engine failed after {frames} frames")]
    EngineFailed {
        /// Frames already produced and forwarded; they are not retracted.
        frames: u64,
    },
}

/// Pump result type.
pub type Result<T> = std::result::Result<T, PumpError>;
