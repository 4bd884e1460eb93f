//! CAN frame construction for the motor register protocol

use serde::{Deserialize, Serialize};

use crate::constants::{
    command, param, run_mode, stop_variant, FRAME_LEN, SET_ZERO_FLAG, WRITE_ADDRESS_BASE,
};
use crate::error::{CodecError, CodecResult};
use crate::register::RegisterIndex;

/// A single frame as exchanged with the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    /// Bus interface tag (e.g. "can0")
    pub interface: String,
    /// 11- or 29-bit identifier
    pub id: u32,
    /// Payload, at most 8 bytes
    pub data: Vec<u8>,
    /// Extended (29-bit) identifier format
    pub extended: bool,
}

impl CanFrame {
    pub fn new(interface: impl Into<String>, id: u32, data: Vec<u8>, extended: bool) -> Self {
        Self {
            interface: interface.into(),
            id,
            data,
            extended,
        }
    }

    /// Reject payloads that do not fit a classic CAN frame
    pub fn validate(&self) -> CodecResult<()> {
        if self.data.len() > FRAME_LEN {
            return Err(CodecError::DataTooLong {
                max: FRAME_LEN,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Value carried by a parameter write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// IEEE-754 single precision, little-endian
    F32(f32),
    /// Little-endian integer (only the low byte is non-zero)
    U8(u8),
}

impl ParamValue {
    fn to_le_bytes(self) -> [u8; 4] {
        match self {
            ParamValue::F32(v) => v.to_le_bytes(),
            ParamValue::U8(v) => u32::from(v).to_le_bytes(),
        }
    }
}

/// Operation addressed to one motor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    WriteParameter { index: u16, value: ParamValue },
    Enable,
    Disable,
    ClearFault,
    SetZero,
}

impl MotorCommand {
    /// Switch the drive into position-profile mode
    pub fn position_profile_mode() -> Self {
        MotorCommand::WriteParameter {
            index: param::RUN_MODE,
            value: ParamValue::U8(run_mode::POSITION_PROFILE),
        }
    }

    pub fn target_angle(radians: f32) -> Self {
        Self::register(RegisterIndex::TargetAngle, radians)
    }

    pub fn speed_limit(speed: f32) -> Self {
        MotorCommand::WriteParameter {
            index: param::SPEED_LIMIT,
            value: ParamValue::F32(speed),
        }
    }

    /// Float write to one of the readable registers
    pub fn register(register: RegisterIndex, value: f32) -> Self {
        MotorCommand::WriteParameter {
            index: register.index(),
            value: ParamValue::F32(value),
        }
    }

    /// Command byte placed in bits 24..32 of the identifier
    pub fn command_byte(&self) -> u8 {
        match self {
            MotorCommand::WriteParameter { .. } => command::WRITE_PARAMETER,
            MotorCommand::Enable => command::ENABLE,
            MotorCommand::Disable | MotorCommand::ClearFault => command::STOP,
            MotorCommand::SetZero => command::SET_ZERO,
        }
    }

    /// Eight byte payload for this command
    pub fn payload(&self) -> [u8; FRAME_LEN] {
        let mut data = [0u8; FRAME_LEN];
        match *self {
            MotorCommand::WriteParameter { index, value } => {
                data[..2].copy_from_slice(&index.to_le_bytes());
                data[4..].copy_from_slice(&value.to_le_bytes());
            }
            MotorCommand::Enable => {}
            MotorCommand::Disable => data[0] = stop_variant::DISABLE,
            MotorCommand::ClearFault => data[0] = stop_variant::CLEAR_FAULT,
            MotorCommand::SetZero => data[0] = SET_ZERO_FLAG,
        }
        data
    }
}

/// Identifier of a write-path frame: `cmd << 24 | 0xFD00 | motor`
pub fn write_identifier(command_byte: u8, motor: u8) -> u32 {
    (u32::from(command_byte) << 24) | WRITE_ADDRESS_BASE | u32::from(motor)
}

/// Build the frame that performs `command` on `motor`
///
/// Motor frames always use the extended identifier format.
pub fn build_write_frame(iface: &str, motor: u8, command: &MotorCommand) -> CanFrame {
    CanFrame::new(
        iface,
        write_identifier(command.command_byte(), motor),
        command.payload().to_vec(),
        true,
    )
}

/// Payload of a parameter write: index LE, two zero bytes, value LE
pub fn encode_register(index: u16, value: f32) -> [u8; FRAME_LEN] {
    MotorCommand::WriteParameter {
        index,
        value: ParamValue::F32(value),
    }
    .payload()
}

/// Identifier of a read request sent from `host` to `motor`
pub fn read_request_id(host: u8, motor: u8) -> u32 {
    (u32::from(command::READ_PARAMETER) << 24) | (u32::from(host) << 8) | u32::from(motor)
}

/// Identifier the motor answers a read request with (host and motor swapped)
pub fn read_response_id(host: u8, motor: u8) -> u32 {
    (u32::from(command::READ_PARAMETER) << 24) | (u32::from(motor) << 8) | u32::from(host)
}

/// Payload of a read request: index LE, rest zero
pub fn read_request_data(index: u16) -> [u8; FRAME_LEN] {
    let mut data = [0u8; FRAME_LEN];
    data[..2].copy_from_slice(&index.to_le_bytes());
    data
}

/// Full read request frame for one register of one motor
pub fn build_read_request(iface: &str, host: u8, motor: u8, register: RegisterIndex) -> CanFrame {
    CanFrame::new(
        iface,
        read_request_id(host, motor),
        read_request_data(register.index()).to_vec(),
        true,
    )
}

/// Motor id carried in the low address byte of a write identifier
pub fn motor_from_identifier(id: u32) -> u8 {
    (id & 0xFF) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HOST_ID;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_mode_frame() {
        let frame = build_write_frame("can0", 61, &MotorCommand::position_profile_mode());
        assert_eq!(frame.id, 0x1200_FD3D);
        assert_eq!(frame.data, vec![0x05, 0x70, 0, 0, 0x01, 0, 0, 0]);
        assert!(frame.extended);
    }

    #[test]
    fn test_angle_frame_payload() {
        let frame = build_write_frame("can1", 52, &MotorCommand::target_angle(1.0));
        assert_eq!(frame.id, 0x1200_FD34);
        assert_eq!(frame.interface, "can1");
        // 1.0f32 = 0x3F800000
        assert_eq!(frame.data, vec![0x16, 0x70, 0, 0, 0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn test_speed_limit_index() {
        let frame = build_write_frame("can0", 51, &MotorCommand::speed_limit(0.8));
        assert_eq!(&frame.data[..4], &[0x24, 0x70, 0, 0]);
        assert_eq!(&frame.data[4..], &0.8f32.to_le_bytes());
    }

    #[test]
    fn test_non_parameter_commands() {
        let enable = build_write_frame("can0", 61, &MotorCommand::Enable);
        assert_eq!(enable.id, 0x0300_FD3D);
        assert_eq!(enable.data, vec![0; 8]);

        let disable = build_write_frame("can0", 61, &MotorCommand::Disable);
        assert_eq!(disable.id, 0x0400_FD3D);
        assert_eq!(disable.data, vec![0; 8]);

        let clear = build_write_frame("can0", 61, &MotorCommand::ClearFault);
        assert_eq!(clear.id, 0x0400_FD3D);
        assert_eq!(clear.data, vec![1, 0, 0, 0, 0, 0, 0, 0]);

        let zero = build_write_frame("can0", 61, &MotorCommand::SetZero);
        assert_eq!(zero.id, 0x0600_FD3D);
        assert_eq!(zero.data, vec![1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_read_identifier_asymmetry() {
        assert_eq!(read_request_id(HOST_ID, 0x3D), 0x1100_FD3D);
        assert_eq!(read_response_id(HOST_ID, 0x3D), 0x1100_3DFD);
        assert_ne!(read_request_id(HOST_ID, 0x3D), read_response_id(HOST_ID, 0x3D));
    }

    #[test]
    fn test_read_request_frame() {
        let frame = build_read_request("can0", HOST_ID, 61, RegisterIndex::PositionGain);
        assert_eq!(frame.id, 0x1100_FD3D);
        assert_eq!(frame.data, vec![0x1E, 0x70, 0, 0, 0, 0, 0, 0]);
        assert!(frame.extended);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let frame = CanFrame::new("can0", 0x28, vec![0; 9], false);
        assert_eq!(
            frame.validate(),
            Err(CodecError::DataTooLong { max: 8, actual: 9 })
        );
        assert!(build_write_frame("can0", 61, &MotorCommand::Enable)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_motor_from_identifier() {
        let frame = build_write_frame("can0", 57, &MotorCommand::Enable);
        assert_eq!(motor_from_identifier(frame.id), 57);
    }
}
