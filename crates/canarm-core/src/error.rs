//! Control error taxonomy

use canarm_bridge::BridgeError;
use canarm_codec::CodecError;
use thiserror::Error;

/// Result type for control operations
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors surfaced by manipulator and gripper operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Motor address not part of the addressed manipulator
    #[error("Invalid motor address {motor} on {interface}")]
    Address { interface: String, motor: u8 },

    /// Request that cannot be turned into frames
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Bridge unreachable or rejected a frame
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request to the bridge timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Data that does not fit the configured hardware
    #[error("Configuration mismatch: {0}")]
    ConfigMismatch(String),

    /// Unknown interface, sequence or profile
    #[error("Not found: {0}")]
    NotFound(String),

    /// Sequence persistence failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ControlError {
    pub fn address(interface: impl Into<String>, motor: u8) -> Self {
        Self::Address {
            interface: interface.into(),
            motor,
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ControlError::Address { .. } => 400,
            ControlError::Encoding(_) => 400,
            ControlError::Transport(_) => 503,
            ControlError::Timeout(_) => 504,
            ControlError::ConfigMismatch(_) => 409,
            ControlError::NotFound(_) => 404,
            ControlError::Storage(_) => 500,
        }
    }
}

impl From<CodecError> for ControlError {
    fn from(err: CodecError) -> Self {
        ControlError::Encoding(err.to_string())
    }
}

impl From<BridgeError> for ControlError {
    fn from(err: BridgeError) -> Self {
        if err.is_timeout() {
            ControlError::Timeout(err.to_string())
        } else {
            ControlError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ControlError::address("can0", 99).status_code(), 400);
        assert_eq!(ControlError::Timeout("x".into()).status_code(), 504);
        assert_eq!(ControlError::NotFound("x".into()).status_code(), 404);
    }

    #[test]
    fn test_bridge_error_conversion() {
        let err: ControlError = BridgeError::server_error(500, "boom").into();
        assert!(matches!(err, ControlError::Transport(_)));

        let err: ControlError = BridgeError::server_error(504, "slow").into();
        assert!(matches!(err, ControlError::Timeout(_)));
    }

    #[test]
    fn test_codec_error_conversion() {
        let err: ControlError = CodecError::InvalidHandPose("short".into()).into();
        assert!(matches!(err, ControlError::Encoding(_)));
    }
}
