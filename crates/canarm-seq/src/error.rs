//! Sequence tooling errors

use canarm_core::ControlError;
use thiserror::Error;

/// Result type for sequence operations
pub type SequenceResult<T> = Result<T, SequenceError>;

#[derive(Debug, Error)]
pub enum SequenceError {
    /// No sequence or merged file with that name
    #[error("Sequence not found: {0}")]
    NotFound(String),

    /// Nothing recorded for the interface
    #[error("No recorded way-points for {0}")]
    EmptyRecording(String),

    /// Sequences do not form a left/right pair
    #[error("Side mismatch: {0}")]
    SideMismatch(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed sequence file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SequenceError> for ControlError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::NotFound(name) => ControlError::NotFound(name),
            SequenceError::EmptyRecording(_) => ControlError::NotFound(err.to_string()),
            SequenceError::SideMismatch(msg) => ControlError::ConfigMismatch(msg),
            SequenceError::Io(_) | SequenceError::Json(_) => ControlError::Storage(err.to_string()),
        }
    }
}
