//! Motor addresses and manipulators

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use canarm_codec::constants::address;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Bus address of one joint motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotorAddress(pub u8);

impl MotorAddress {
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Side implied by the reserved address ranges
    pub fn side(self) -> Side {
        if address::LEFT_ARM.contains(&self.0) {
            Side::Left
        } else if address::RIGHT_ARM.contains(&self.0) {
            Side::Right
        } else {
            Side::Unknown
        }
    }
}

impl fmt::Display for MotorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MotorAddress {
    type Err = ControlError;

    /// Parse the decimal id used as way-point key (`"61"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(MotorAddress)
            .map_err(|_| ControlError::Encoding(format!("invalid motor id: {:?}", s)))
    }
}

impl From<u8> for MotorAddress {
    fn from(id: u8) -> Self {
        MotorAddress(id)
    }
}

/// Which arm a manipulator or sequence belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Side {
    /// Standard motor range for this side
    pub fn motor_range(self) -> Option<std::ops::RangeInclusive<u8>> {
        match self {
            Side::Left => Some(address::LEFT_ARM),
            Side::Right => Some(address::RIGHT_ARM),
            Side::Unknown => None,
        }
    }

    /// Side named in a device name such as `left_black_arm`
    pub fn from_device_name(name: &str) -> Option<Side> {
        if name.contains("left") {
            Some(Side::Left)
        } else if name.contains("right") {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Side shared by every address, `Unknown` if they disagree
    pub fn from_addresses(motors: &[MotorAddress]) -> Side {
        let Some(first) = motors.first() else {
            return Side::Unknown;
        };
        let side = first.side();
        if motors.iter().all(|m| m.side() == side) {
            side
        } else {
            Side::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(ControlError::NotFound(format!("unknown side: {}", other))),
        }
    }
}

/// One arm: an ordered set of joint motors on a bus interface
///
/// The order of `motors` is the joint order used by every whole-arm
/// operation. It is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manipulator {
    interface: String,
    motors: Vec<MotorAddress>,
    side: Side,
}

impl Manipulator {
    /// Build a manipulator from explicit motor ids
    ///
    /// Fails if the list is empty or contains a duplicate address.
    pub fn new(interface: impl Into<String>, motors: Vec<MotorAddress>) -> ControlResult<Self> {
        let interface = interface.into();
        if motors.is_empty() {
            return Err(ControlError::ConfigMismatch(format!(
                "manipulator on {} has no motors",
                interface
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = motors.iter().find(|m| !seen.insert(**m)) {
            return Err(ControlError::ConfigMismatch(format!(
                "duplicate motor {} on {}",
                dup, interface
            )));
        }
        let side = Side::from_addresses(&motors);
        Ok(Self {
            interface,
            motors,
            side,
        })
    }

    /// Manipulator with the standard motor range of `side`
    pub fn for_side(interface: impl Into<String>, side: Side) -> ControlResult<Self> {
        let range = side.motor_range().ok_or_else(|| {
            ControlError::ConfigMismatch("no standard motor range for an unknown side".into())
        })?;
        Self::new(interface, range.map(MotorAddress).collect())
    }

    /// Manipulator whose motor range is picked from a device name
    ///
    /// Names without "left" or "right" fall back to the right arm.
    pub fn from_device_name(interface: impl Into<String>, device_name: &str) -> Self {
        let interface = interface.into();
        let side = Side::from_device_name(device_name).unwrap_or_else(|| {
            tracing::warn!(
                interface = %interface,
                device_name,
                "Cannot tell arm side from device name, using right arm motors"
            );
            Side::Right
        });
        let range = match side {
            Side::Left => address::LEFT_ARM,
            _ => address::RIGHT_ARM,
        };
        Self {
            interface,
            motors: range.map(MotorAddress).collect(),
            side,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn motors(&self) -> &[MotorAddress] {
        &self.motors
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of joints
    pub fn len(&self) -> usize {
        self.motors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motors.is_empty()
    }

    /// First joint, used as representative for static registers
    pub fn first(&self) -> MotorAddress {
        self.motors[0]
    }

    pub fn contains(&self, motor: MotorAddress) -> bool {
        self.motors.contains(&motor)
    }

    /// Check that `motor` belongs to this manipulator
    pub fn validate(&self, motor: MotorAddress) -> ControlResult<MotorAddress> {
        if self.contains(motor) {
            Ok(motor)
        } else {
            Err(ControlError::address(&self.interface, motor.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(51, Side::Right)]
    #[case(57, Side::Right)]
    #[case(61, Side::Left)]
    #[case(67, Side::Left)]
    #[case(58, Side::Unknown)]
    #[case(40, Side::Unknown)]
    fn test_address_side(#[case] id: u8, #[case] side: Side) {
        assert_eq!(MotorAddress(id).side(), side);
    }

    #[test]
    fn test_for_side_orders_joints() {
        let arm = Manipulator::for_side("can0", Side::Left).unwrap();
        let ids: Vec<u8> = arm.motors().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![61, 62, 63, 64, 65, 66, 67]);
        assert_eq!(arm.side(), Side::Left);
        assert_eq!(arm.first(), MotorAddress(61));
    }

    #[test]
    fn test_duplicate_motor_rejected() {
        let err = Manipulator::new("can0", vec![MotorAddress(51), MotorAddress(51)]).unwrap_err();
        assert!(matches!(err, ControlError::ConfigMismatch(_)));
    }

    #[test]
    fn test_mixed_ranges_are_unknown_side() {
        let arm = Manipulator::new("can0", vec![MotorAddress(51), MotorAddress(61)]).unwrap();
        assert_eq!(arm.side(), Side::Unknown);
    }

    #[rstest]
    #[case("left_black_arm", Side::Left, 61)]
    #[case("right_black_arm", Side::Right, 51)]
    #[case("black_arm", Side::Right, 51)]
    fn test_from_device_name(#[case] name: &str, #[case] side: Side, #[case] first: u8) {
        let arm = Manipulator::from_device_name("can0", name);
        assert_eq!(arm.side(), side);
        assert_eq!(arm.first(), MotorAddress(first));
        assert_eq!(arm.len(), 7);
    }

    #[test]
    fn test_validate() {
        let arm = Manipulator::for_side("can1", Side::Right).unwrap();
        assert!(arm.validate(MotorAddress(53)).is_ok());
        assert_eq!(
            arm.validate(MotorAddress(63)).unwrap_err(),
            ControlError::address("can1", 63)
        );
    }

    #[test]
    fn test_side_serde() {
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
        let side: Side = serde_json::from_str("\"middle\"").unwrap();
        assert_eq!(side, Side::Unknown);
    }
}
