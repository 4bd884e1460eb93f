//! Error types for frame encoding and decoding

use thiserror::Error;

/// Errors that can occur while building or parsing frames
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload shorter than the fixed frame layout
    #[error("data too short: expected {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    /// Payload longer than a classic CAN frame
    #[error("data too long: at most {max} bytes, got {actual}")]
    DataTooLong { max: usize, actual: usize },

    /// Index not present in the register table
    #[error("unknown register: 0x{0:04X}")]
    UnknownRegister(u16),

    /// Finger values that do not form a hand pose
    #[error("invalid hand pose: {0}")]
    InvalidHandPose(String),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
