//! # Error Types
//!
//! Custom error types for Joy Teleop using `thiserror`.

use thiserror::Error;

/// Main error type for Joy Teleop
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input or unencodable output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame lookup could not be resolved
    #[error("Transform from {source_frame} to {target_frame} unavailable: {reason}")]
    Transform {
        target_frame: String,
        source_frame: String,
        reason: String,
    },

    /// Input device errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable input device was found
    #[error("No gamepad found under /dev/input")]
    ControllerNotFound,

    /// Serial output errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// The outbound writer has gone away
    #[error("Output channel closed")]
    OutputClosed,
}

/// Result type alias for Joy Teleop
pub type Result<T> = std::result::Result<T, TeleopError>;
