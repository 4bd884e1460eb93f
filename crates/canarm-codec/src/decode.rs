//! Decoding of register read-back payloads

use crate::constants::FRAME_LEN;
use crate::error::{CodecError, CodecResult};
use crate::register::RegisterIndex;

/// One decoded register observation
///
/// The raw value bits are kept so callers can compare observations exactly,
/// NaN and subnormal patterns included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterReading {
    /// Register index from bytes 0..2 (little-endian)
    pub index: u16,
    /// Value bit pattern from bytes 4..8 (little-endian)
    pub raw: u32,
}

impl RegisterReading {
    /// Value reinterpreted as IEEE-754 single precision
    pub fn value(&self) -> f32 {
        f32::from_bits(self.raw)
    }

    /// Known register this reading belongs to, if any
    pub fn register(&self) -> Option<RegisterIndex> {
        RegisterIndex::try_from(self.index).ok()
    }
}

/// Decode a read-back payload
///
/// Payloads shorter than eight bytes are rejected.
pub fn decode(data: &[u8]) -> CodecResult<RegisterReading> {
    if data.len() < FRAME_LEN {
        return Err(CodecError::DataTooShort {
            expected: FRAME_LEN,
            actual: data.len(),
        });
    }
    let index = u16::from_le_bytes([data[0], data[1]]);
    let raw = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    Ok(RegisterReading { index, raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_register;

    #[test]
    fn test_decode_angle() {
        let data = [0x16, 0x70, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F];
        let reading = decode(&data).unwrap();
        assert_eq!(reading.index, 0x7016);
        assert_eq!(reading.value(), 1.0);
        assert_eq!(reading.register(), Some(RegisterIndex::TargetAngle));
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        let err = decode(&[0x16, 0x70, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            CodecError::DataTooShort {
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn test_decode_unknown_register() {
        let reading = decode(&encode_register(0x1234, 2.0)).unwrap();
        assert_eq!(reading.register(), None);
        assert_eq!(reading.value(), 2.0);
    }

    #[test]
    fn test_nan_pattern_is_preserved() {
        let nan = f32::from_bits(0x7FC0_0001);
        let reading = decode(&encode_register(0x7016, nan)).unwrap();
        assert_eq!(reading.raw, 0x7FC0_0001);
    }
}
