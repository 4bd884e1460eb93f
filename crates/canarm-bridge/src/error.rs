//! Error types for bridge operations

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while talking to the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid bridge URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Bridge answered with a non-success status
    #[error("Bridge error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Frame could not be represented on the wire
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Bus not reachable (used by the in-memory bus)
    #[error("Bus unavailable: {0}")]
    Unavailable(String),
}

impl BridgeError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure was a request timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            BridgeError::HttpError(e) => e.is_timeout(),
            BridgeError::ServerError { status, .. } => *status == 408 || *status == 504,
            _ => false,
        }
    }
}
