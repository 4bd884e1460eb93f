//! Gripper (dexterous hand) frames
//!
//! Hands listen on a standard 11-bit identifier equal to their device id and
//! take one control byte followed by six finger positions.

use serde::{Deserialize, Serialize};

use crate::constants::hand;
use crate::error::{CodecError, CodecResult};
use crate::frame::CanFrame;

/// Finger positions, 0 = open, 255 = closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandPose {
    pub thumb: u8,
    pub thumb_rotate: u8,
    pub index: u8,
    pub middle: u8,
    pub ring: u8,
    pub pinky: u8,
}

impl HandPose {
    /// Build a pose from at least six finger values, in wire order
    pub fn from_slice(values: &[u8]) -> CodecResult<Self> {
        if values.len() < hand::CHANNELS {
            return Err(CodecError::InvalidHandPose(format!(
                "expected {} finger values, got {}",
                hand::CHANNELS,
                values.len()
            )));
        }
        Ok(Self {
            thumb: values[0],
            thumb_rotate: values[1],
            index: values[2],
            middle: values[3],
            ring: values[4],
            pinky: values[5],
        })
    }

    /// Finger values in wire order
    pub fn to_array(&self) -> [u8; hand::CHANNELS] {
        [
            self.thumb,
            self.thumb_rotate,
            self.index,
            self.middle,
            self.ring,
            self.pinky,
        ]
    }
}

/// Build a finger position frame for the hand at `device_id`
pub fn build_hand_frame(iface: &str, device_id: u32, pose: &HandPose) -> CanFrame {
    let mut data = Vec::with_capacity(1 + hand::CHANNELS);
    data.push(hand::CONTROL_CODE);
    data.extend_from_slice(&pose.to_array());
    CanFrame::new(iface, device_id, data, false)
}
