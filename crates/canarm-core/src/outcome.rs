//! Structured operation outcome

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ControlResult;

/// `{success, message, data}` rendering of any operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    /// Render a result, prefixing failures with what was attempted
    pub fn from_result<T: Serialize>(action: &str, result: ControlResult<T>) -> Self {
        match result {
            Ok(data) => {
                let outcome = Self::ok(format!("{} succeeded", action));
                match serde_json::to_value(data) {
                    Ok(Value::Null) | Err(_) => outcome,
                    Ok(value) => Self {
                        data: Some(value),
                        ..outcome
                    },
                }
            }
            Err(e) => Self::failed(format!("{} failed: {}", action, e)),
        }
    }
}
