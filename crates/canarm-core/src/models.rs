//! Joint sequence data model

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ControlError;
use crate::manipulator::{MotorAddress, Side};

/// Manipulator generation; joint directions differ between the two
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmModel {
    #[default]
    Old,
    New,
}

impl ArmModel {
    pub fn as_str(self) -> &'static str {
        match self {
            ArmModel::Old => "old",
            ArmModel::New => "new",
        }
    }
}

impl fmt::Display for ArmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmModel {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "old" => Ok(ArmModel::Old),
            "new" => Ok(ArmModel::New),
            other => Err(ControlError::Encoding(format!("unknown arm model: {}", other))),
        }
    }
}

/// One way-point: target angle per motor
///
/// Keys are decimal motor ids. A joint missing from `values` is left where
/// it is when the way-point is played.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngleSet {
    pub name: String,
    #[serde(default)]
    pub values: BTreeMap<String, f32>,
}

impl JointAngleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter for one joint
    pub fn with(mut self, motor: impl Into<MotorAddress>, angle: f32) -> Self {
        self.set(motor.into(), angle);
        self
    }

    pub fn set(&mut self, motor: MotorAddress, angle: f32) {
        self.values.insert(motor.to_string(), angle);
    }

    pub fn get(&self, motor: MotorAddress) -> Option<f32> {
        self.values.get(&motor.to_string()).copied()
    }
}

/// Recorded trajectory for one arm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointSequence {
    pub name: String,
    #[serde(rename = "arm_type", default)]
    pub side: Side,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub arm_model: Option<ArmModel>,
    #[serde(default)]
    pub angles: Vec<JointAngleSet>,
}

impl JointSequence {
    pub fn new(name: impl Into<String>, side: Side, arm_model: Option<ArmModel>) -> Self {
        Self {
            name: name.into(),
            side,
            arm_model,
            angles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }
}

/// File layout of a merged left/right pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedSequences {
    #[serde(default)]
    pub joint_sequences: Vec<JointSequence>,
}

impl MergedSequences {
    pub fn new(joint_sequences: Vec<JointSequence>) -> Self {
        Self { joint_sequences }
    }

    /// Last sequence tagged for `side`
    pub fn for_side(&self, side: Side) -> Option<&JointSequence> {
        self.joint_sequences.iter().rev().find(|s| s.side == side)
    }

    pub fn left(&self) -> Option<&JointSequence> {
        self.for_side(Side::Left)
    }

    pub fn right(&self) -> Option<&JointSequence> {
        self.for_side(Side::Right)
    }

    /// Holds a sequence for both arms
    pub fn is_pair(&self) -> bool {
        self.left().is_some() && self.right().is_some()
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<ArmModel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequence_wire_format() {
        let json = r#"{
            "name": "wave_up",
            "arm_type": "left",
            "arm_model": "new",
            "angles": [{"name": "p1", "values": {"61": 0.5, "62": -0.25}}]
        }"#;
        let seq: JointSequence = serde_json::from_str(json).unwrap();
        assert_eq!(seq.side, Side::Left);
        assert_eq!(seq.arm_model, Some(ArmModel::New));
        assert_eq!(seq.angles[0].get(MotorAddress(62)), Some(-0.25));
        assert_eq!(seq.angles[0].get(MotorAddress(63)), None);

        let value = serde_json::to_value(&seq).unwrap();
        assert_eq!(value["arm_type"], "left");
        assert_eq!(value["angles"][0]["values"]["61"], 0.5);
    }

    #[test]
    fn test_empty_arm_model_reads_as_none() {
        let seq: JointSequence =
            serde_json::from_str(r#"{"name": "a", "arm_type": "right", "arm_model": ""}"#)
                .unwrap();
        assert_eq!(seq.arm_model, None);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_merged_lookup_by_side() {
        let merged = MergedSequences::new(vec![
            JointSequence::new("l", Side::Left, None),
            JointSequence::new("r", Side::Right, None),
        ]);
        assert!(merged.is_pair());
        assert_eq!(merged.right().map(|s| s.name.as_str()), Some("r"));

        let single = MergedSequences::new(vec![JointSequence::new("l", Side::Left, None)]);
        assert!(!single.is_pair());
    }
}
