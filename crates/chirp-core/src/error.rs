//! Error types for chirp.

use thiserror::Error;

/// Main error type for audio operations.
///
/// Only setup and loading paths produce these. The real-time paths
/// (ring buffer, synthesis, the device callback) never fail.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Audio device is not open")]
    NotInitialized,
}

/// Result type alias for chirp operations.
pub type Result<T> = std::result::Result<T, AudioError>;
