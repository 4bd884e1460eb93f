//! canarm-codec - CAN frame codec for joint motors and grippers
//!
//! Pure encoding/decoding for the motor register protocol spoken on the arm
//! buses. Nothing in this crate touches the network.
//!
//! # Identifier layout
//!
//! ```text
//!  write:          cmd << 24 | 0xFD00 | motor
//!  read request:   0x11 << 24 | host << 8 | motor
//!  read response:  0x11 << 24 | motor << 8 | host
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use canarm_codec::{build_write_frame, decode, MotorCommand};
//!
//! let frame = build_write_frame("can0", 61, &MotorCommand::target_angle(1.5));
//! assert_eq!(frame.id, 0x1200_FD3D);
//!
//! let reading = decode(&frame.data).unwrap();
//! assert_eq!(reading.index, 0x7016);
//! assert_eq!(reading.value(), 1.5);
//! ```

pub mod constants;
pub mod decode;
pub mod error;
pub mod frame;
pub mod gripper;
pub mod register;

pub use decode::{decode, RegisterReading};
pub use error::{CodecError, CodecResult};
pub use frame::{
    build_read_request, build_write_frame, encode_register, motor_from_identifier,
    read_request_data, read_request_id, read_response_id, write_identifier, CanFrame,
    MotorCommand, ParamValue,
};
pub use gripper::{build_hand_frame, HandPose};
pub use register::RegisterIndex;
