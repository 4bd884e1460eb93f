//! Protocol constant table
//!
//! Every magic number of the bus protocol lives here. Encoders take their
//! values from this table and never from device names or other free text.

use std::ops::RangeInclusive;

/// Data length of every motor frame
pub const FRAME_LEN: usize = 8;

/// Host address used by the controller on the motor bus
pub const HOST_ID: u8 = 0xFD;

/// Middle bytes of every write identifier (`cmd << 24 | 0xFD00 | motor`)
pub const WRITE_ADDRESS_BASE: u32 = 0xFD00;

/// Command bytes (bits 24..32 of the identifier)
pub mod command {
    /// Drive enable
    pub const ENABLE: u8 = 0x03;
    /// Drive stop; payload byte 0 selects disable (0) or clear-fault (1)
    pub const STOP: u8 = 0x04;
    /// Store current position as mechanical zero
    pub const SET_ZERO: u8 = 0x06;
    /// Single parameter read
    pub const READ_PARAMETER: u8 = 0x11;
    /// Single parameter write
    pub const WRITE_PARAMETER: u8 = 0x12;
}

/// First payload byte for commands that carry no value
pub mod stop_variant {
    pub const DISABLE: u8 = 0x00;
    pub const CLEAR_FAULT: u8 = 0x01;
}

/// First payload byte of the set-zero command
pub const SET_ZERO_FLAG: u8 = 0x01;

/// Parameter indices in the motor register table
pub mod param {
    pub const RUN_MODE: u16 = 0x7005;
    pub const TARGET_ANGLE: u16 = 0x7016;
    pub const POSITION_GAIN: u16 = 0x701E;
    pub const VELOCITY_GAIN: u16 = 0x701F;
    pub const VELOCITY_INTEGRAL_GAIN: u16 = 0x7020;
    pub const VELOCITY_FILTER_GAIN: u16 = 0x7021;
    pub const SPEED_LIMIT: u16 = 0x7024;
}

/// Values of the run-mode parameter
pub mod run_mode {
    /// Position profile (PP) mode
    pub const POSITION_PROFILE: u8 = 0x01;
}

/// Reserved motor and device address ranges
pub mod address {
    use super::RangeInclusive;

    /// Right arm joints
    pub const RIGHT_ARM: RangeInclusive<u8> = 51..=57;
    /// Left arm joints
    pub const LEFT_ARM: RangeInclusive<u8> = 61..=67;
    /// Left gripper device id
    pub const LEFT_HAND: u32 = 0x28;
    /// Right gripper device id
    pub const RIGHT_HAND: u32 = 0x27;
}

/// Gripper protocol
pub mod hand {
    /// Leading byte of a finger position command
    pub const CONTROL_CODE: u8 = 0x01;
    /// Number of finger channels
    pub const CHANNELS: usize = 6;
}
