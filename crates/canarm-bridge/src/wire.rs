//! JSON bodies exchanged with the bridge

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use canarm_codec::CanFrame;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Body of `POST /api/can`
///
/// `data` is the payload in standard base64, the way the bridge's existing
/// clients serialise raw byte arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub interface: String,
    pub id: u32,
    pub data: String,
    pub extended: bool,
}

impl SendRequest {
    pub fn from_frame(frame: &CanFrame) -> Self {
        Self {
            interface: frame.interface.clone(),
            id: frame.id,
            data: STANDARD.encode(&frame.data),
            extended: frame.extended,
        }
    }

    pub fn into_frame(self) -> Result<CanFrame> {
        let data = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| BridgeError::InvalidFrame(format!("bad base64 payload: {}", e)))?;
        Ok(CanFrame::new(self.interface, self.id, data, self.extended))
    }
}

/// Body of `GET /api/messages/{iface}?id=..`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: PollData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollData {
    #[serde(default)]
    pub messages: Vec<PolledMessage>,
}

/// One buffered frame, payload as two-digit hex strings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolledMessage {
    #[serde(default)]
    pub hex_data: Vec<String>,
}

impl PolledMessage {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            hex_data: data.iter().map(|b| hex::encode([*b])).collect(),
        }
    }

    /// Payload bytes, or `None` if any entry is not a hex byte
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.hex_data
            .iter()
            .map(|s| u8::from_str_radix(s.trim(), 16).ok())
            .collect()
    }
}

impl PollResponse {
    pub fn ok(payloads: &[Vec<u8>]) -> Self {
        Self {
            status: "success".to_string(),
            data: PollData {
                messages: payloads
                    .iter()
                    .map(|p| PolledMessage::from_bytes(p))
                    .collect(),
            },
        }
    }

    /// Well-formed payloads in arrival order
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.data
            .messages
            .iter()
            .filter_map(|m| {
                let bytes = m.bytes();
                if bytes.is_none() {
                    tracing::debug!(hex = ?m.hex_data, "Skipping malformed polled frame");
                }
                bytes
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_send_request_encodes_base64() {
        let frame = CanFrame::new("can0", 0x1200_FD3D, vec![0x05, 0x70, 0, 0, 1, 0, 0, 0], true);
        let request = SendRequest::from_frame(&frame);
        assert_eq!(request.data, "BXAAAAEAAAA=");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["interface"], "can0");
        assert_eq!(json["id"], 0x1200_FD3D);
        assert_eq!(json["extended"], true);

        assert_eq!(request.into_frame().unwrap(), frame);
    }

    #[test]
    fn test_poll_response_parsing() {
        let body = r#"{
            "status": "success",
            "data": {"messages": [
                {"hex_data": ["16", "70", "00", "00", "00", "00", "80", "3f"]},
                {"hex_data": ["zz"]},
                {"hex_data": ["a", "B"]}
            ]}
        }"#;
        let response: PollResponse = serde_json::from_str(body).unwrap();
        let payloads = response.payloads();
        assert_eq!(
            payloads,
            vec![
                vec![0x16, 0x70, 0, 0, 0, 0, 0x80, 0x3F],
                vec![0x0A, 0x0B]
            ]
        );
    }

    #[test]
    fn test_poll_response_missing_data() {
        let response: PollResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(response.payloads().is_empty());
    }

    #[test]
    fn test_polled_message_hex_is_lowercase_two_digit() {
        let message = PolledMessage::from_bytes(&[0x0A, 0xFF]);
        assert_eq!(message.hex_data, vec!["0a", "ff"]);
    }
}
