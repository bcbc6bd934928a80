//! Error types for the ascent_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ascent_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Network or transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the stored credential (401)
    #[error("Not authenticated: please log in again")]
    Unauthorized,

    /// Any other non-2xx response
    #[error("Request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Local form validation failed before any request was made
    #[error("{0}")]
    Validation(String),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token persistence error
    #[error("Token store error: {0}")]
    TokenStore(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status carried by this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized => Some(401),
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
