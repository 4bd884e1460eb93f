//! Readable register table

use serde::{Deserialize, Serialize};

use crate::constants::param;
use crate::error::CodecError;

/// Motor registers that can be read back over the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterIndex {
    /// Commanded joint angle (`loc_ref`), retransmitted continuously
    TargetAngle,
    /// Position loop proportional gain (`loc_kp`)
    PositionGain,
    /// Velocity loop proportional gain (`spd_kp`)
    VelocityGain,
    /// Velocity loop integral gain (`spd_ki`)
    VelocityIntegralGain,
    /// Velocity filter gain (`spd_filt_gain`)
    VelocityFilterGain,
}

impl RegisterIndex {
    /// All registers in table order
    pub const ALL: [RegisterIndex; 5] = [
        RegisterIndex::TargetAngle,
        RegisterIndex::PositionGain,
        RegisterIndex::VelocityGain,
        RegisterIndex::VelocityIntegralGain,
        RegisterIndex::VelocityFilterGain,
    ];

    /// Static configuration registers (identical on every joint of an arm)
    pub const GAINS: [RegisterIndex; 4] = [
        RegisterIndex::PositionGain,
        RegisterIndex::VelocityGain,
        RegisterIndex::VelocityIntegralGain,
        RegisterIndex::VelocityFilterGain,
    ];

    /// 16-bit index in the motor parameter table
    pub const fn index(self) -> u16 {
        match self {
            RegisterIndex::TargetAngle => param::TARGET_ANGLE,
            RegisterIndex::PositionGain => param::POSITION_GAIN,
            RegisterIndex::VelocityGain => param::VELOCITY_GAIN,
            RegisterIndex::VelocityIntegralGain => param::VELOCITY_INTEGRAL_GAIN,
            RegisterIndex::VelocityFilterGain => param::VELOCITY_FILTER_GAIN,
        }
    }

    /// Short register name as used in feedback reports
    pub const fn name(self) -> &'static str {
        match self {
            RegisterIndex::TargetAngle => "loc_ref",
            RegisterIndex::PositionGain => "loc_kp",
            RegisterIndex::VelocityGain => "spd_kp",
            RegisterIndex::VelocityIntegralGain => "spd_ki",
            RegisterIndex::VelocityFilterGain => "spd_filt_gain",
        }
    }
}

impl TryFrom<u16> for RegisterIndex {
    type Error = CodecError;

    fn try_from(index: u16) -> Result<Self, Self::Error> {
        RegisterIndex::ALL
            .into_iter()
            .find(|r| r.index() == index)
            .ok_or(CodecError::UnknownRegister(index))
    }
}

impl From<RegisterIndex> for u16 {
    fn from(register: RegisterIndex) -> Self {
        register.index()
    }
}

impl std::fmt::Display for RegisterIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.index())
    }
}
