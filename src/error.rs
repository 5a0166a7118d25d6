//! Error types for the dualsub library
//!
//! Parse defects, setup failures and translation failures are all recovered
//! inside the library; these types describe them on the way to the log.

use thiserror::Error;

/// Errors produced by the dualsub library
#[derive(Debug, Error)]
pub enum OverlayError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed `HH:MM:SS.mmm` timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Subtitle parsing error
    #[error("Subtitle parsing error: {0}")]
    SubtitleParsing(String),

    /// Translation service error
    #[error("Translation error: {0}")]
    Translation(String),

    /// Unexpected response shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A single setup attempt failed (player not ready, payload unavailable)
    #[error("Setup error: {0}")]
    Setup(String),

    /// All setup attempts failed
    #[error("Setup failed after {attempts} attempts: {last_error}")]
    SetupExhausted { attempts: u32, last_error: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for the dualsub library
pub type Result<T> = std::result::Result<T, OverlayError>;
