//! Merge and mirror transforms for paired sequences
//!
//! A merge takes one recorded sequence per arm and produces a paired
//! artifact. Names decide the direction:
//!
//! - contains "up" (any case): ascending. A synthetic rest way-point is put
//!   in front of each side and the matching descending pair is derived.
//! - contains "down" but not "up": descending. Each side is mirrored.
//! - anything else: plain pairing, sequences kept verbatim.
//!
//! Mirroring drops the last way-point and reverses the rest, so an ascending
//! `[rest, p1, p2, p3]` descends as `[p2, p1, rest]`.

use std::fmt;

use canarm_codec::constants::address;
use canarm_core::{ArmModel, JointAngleSet, JointSequence, MergedSequences, MotorAddress, Side};
use serde::Serialize;

use crate::error::{SequenceError, SequenceResult};

/// Name of the synthetic rest way-point
pub const INITIAL_WAYPOINT: &str = "initial";

/// Offset of the second joint in the rest pose (old generation, left arm)
const SECOND_JOINT_OFFSET: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeDirection {
    Ascending,
    Descending,
    Plain,
}

impl MergeDirection {
    /// Direction named by a merged sequence or file name
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("up") {
            MergeDirection::Ascending
        } else if lower.contains("down") {
            MergeDirection::Descending
        } else {
            MergeDirection::Plain
        }
    }
}

impl fmt::Display for MergeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeDirection::Ascending => "ascending",
            MergeDirection::Descending => "descending",
            MergeDirection::Plain => "plain",
        })
    }
}

/// A named left/right pair ready to be written out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedPair {
    pub name: String,
    /// File stem derived from `name`
    pub file_name: String,
    pub sequences: MergedSequences,
}

impl MergedPair {
    fn new(name: String, left: JointSequence, right: JointSequence) -> Self {
        Self {
            file_name: file_safe_name(&name),
            name,
            sequences: MergedSequences::new(vec![left, right]),
        }
    }
}

/// Result of a merge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub direction: MergeDirection,
    pub arm_model: ArmModel,
    pub primary: MergedPair,
    /// Descending pair derived from an ascending merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_descending: Option<MergedPair>,
}

/// Merge two recorded sequences into a left/right pair
///
/// The two inputs may be given in either order but must cover one side
/// each. The generation comes from `arm_model`, else the first input, else
/// `old`, and is stamped on both outputs. Way-point counts and names are
/// not compared.
pub fn merge(
    first: &JointSequence,
    second: &JointSequence,
    merged_name: &str,
    arm_model: Option<ArmModel>,
) -> SequenceResult<MergeOutcome> {
    let (left, right) = match (first.side, second.side) {
        (Side::Left, Side::Right) => (first, second),
        (Side::Right, Side::Left) => (second, first),
        (a, b) => {
            return Err(SequenceError::SideMismatch(format!(
                "cannot pair {} ({}) with {} ({}): need one left and one right sequence",
                first.name, a, second.name, b
            )))
        }
    };

    let model = arm_model.or(first.arm_model).unwrap_or_default();
    let mut left = left.clone();
    let mut right = right.clone();
    left.arm_model = Some(model);
    right.arm_model = Some(model);

    let direction = MergeDirection::from_name(merged_name);
    tracing::info!(
        merged_name,
        ?direction,
        arm_model = %model,
        left = %left.name,
        right = %right.name,
        "Merging sequences"
    );

    let outcome = match direction {
        MergeDirection::Ascending => {
            left.angles.insert(0, initial_waypoint(Side::Left, model));
            right.angles.insert(0, initial_waypoint(Side::Right, model));

            let derived = MergedPair::new(
                substitute_direction(merged_name),
                mirrored(&left),
                mirrored(&right),
            );
            let primary = MergedPair::new(merged_name.to_string(), left, right);
            // Mixed-case tokens such as "uP" select this branch but are not substituted
            let derived = if derived.file_name == primary.file_name {
                tracing::warn!(
                    merged_name,
                    "No lowercase, capitalised or uppercase \"up\" to substitute, skipping descending pair"
                );
                None
            } else {
                Some(derived)
            };
            MergeOutcome {
                direction,
                arm_model: model,
                primary,
                derived_descending: derived,
            }
        }
        MergeDirection::Descending => {
            left.angles = descend(&left.angles);
            right.angles = descend(&right.angles);
            MergeOutcome {
                direction,
                arm_model: model,
                primary: MergedPair::new(merged_name.to_string(), left, right),
                derived_descending: None,
            }
        }
        MergeDirection::Plain => MergeOutcome {
            direction,
            arm_model: model,
            primary: MergedPair::new(merged_name.to_string(), left, right),
            derived_descending: None,
        },
    };
    Ok(outcome)
}

/// Descending copy of an ascending sequence, renamed
fn mirrored(sequence: &JointSequence) -> JointSequence {
    JointSequence {
        name: substitute_direction(&sequence.name),
        side: sequence.side,
        arm_model: sequence.arm_model,
        angles: descend(&sequence.angles),
    }
}

/// Drop the last way-point and reverse the rest
///
/// Sequences of zero or one way-point are returned unchanged.
pub fn descend(angles: &[JointAngleSet]) -> Vec<JointAngleSet> {
    if angles.len() <= 1 {
        return angles.to_vec();
    }
    angles[..angles.len() - 1].iter().rev().cloned().collect()
}

/// Synthetic rest way-point for one arm
///
/// Every joint of the side's standard range is at zero except the second,
/// which sits at +0.1 (left) or -0.1 (right) on the old generation and the
/// opposite sign on the new one.
pub fn initial_waypoint(side: Side, model: ArmModel) -> JointAngleSet {
    let (range, sign) = match side {
        Side::Left => (address::LEFT_ARM, 1.0),
        _ => (address::RIGHT_ARM, -1.0),
    };
    let sign = match model {
        ArmModel::Old => sign,
        ArmModel::New => -sign,
    };
    let second = range.start() + 1;

    let mut waypoint = JointAngleSet::new(INITIAL_WAYPOINT);
    for id in range {
        let angle = if id == second {
            sign * SECOND_JOINT_OFFSET
        } else {
            0.0
        };
        waypoint.set(MotorAddress(id), angle);
    }
    waypoint
}

/// Replace every direction token: `up`/`Up` become `down`, `UP` becomes `DOWN`
pub fn substitute_direction(name: &str) -> String {
    name.replace("up", "down")
        .replace("Up", "down")
        .replace("UP", "DOWN")
}

/// File stem for a sequence name: non-alphanumerics become `_`
pub fn file_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn point(name: &str, motor: u8, angle: f32) -> JointAngleSet {
        JointAngleSet::new(name).with(motor, angle)
    }

    fn sequence(name: &str, side: Side, points: &[&str]) -> JointSequence {
        let first = side.motor_range().map(|r| *r.start()).unwrap_or(0);
        let mut seq = JointSequence::new(name, side, None);
        seq.angles = points
            .iter()
            .enumerate()
            .map(|(i, p)| point(p, first, i as f32))
            .collect();
        seq
    }

    fn names(seq: &JointSequence) -> Vec<&str> {
        seq.angles.iter().map(|a| a.name.as_str()).collect()
    }

    #[rstest]
    #[case("lift_up", MergeDirection::Ascending)]
    #[case("LIFT_UP", MergeDirection::Ascending)]
    #[case("updown", MergeDirection::Ascending)]
    #[case("Down_slow", MergeDirection::Descending)]
    #[case("wave", MergeDirection::Plain)]
    fn test_direction_from_name(#[case] name: &str, #[case] direction: MergeDirection) {
        assert_eq!(MergeDirection::from_name(name), direction);
    }

    #[rstest]
    #[case("UP_to_rest", "DOWN_to_rest")]
    #[case("Up_slow", "down_slow")]
    #[case("up_and_up", "down_and_down")]
    #[case("wave", "wave")]
    fn test_substitute_direction(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(substitute_direction(name), expected);
    }

    #[rstest]
    #[case("lift up/left", "lift_up_left")]
    #[case("a\\b.c-d", "a_b_c_d")]
    #[case("plain_name", "plain_name")]
    fn test_file_safe_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(file_safe_name(name), expected);
    }

    #[test]
    fn test_descend() {
        let seq = sequence("s", Side::Left, &["a", "b", "c", "d"]);
        let down = descend(&seq.angles);
        assert_eq!(
            down.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            vec!["c", "b", "a"]
        );
        assert_eq!(descend(&seq.angles[..1]), seq.angles[..1].to_vec());
        assert!(descend(&[]).is_empty());
    }

    #[rstest]
    #[case(Side::Left, ArmModel::Old, 62, 0.1)]
    #[case(Side::Right, ArmModel::Old, 52, -0.1)]
    #[case(Side::Left, ArmModel::New, 62, -0.1)]
    #[case(Side::Right, ArmModel::New, 52, 0.1)]
    fn test_initial_waypoint(
        #[case] side: Side,
        #[case] model: ArmModel,
        #[case] second: u8,
        #[case] angle: f32,
    ) {
        let waypoint = initial_waypoint(side, model);
        assert_eq!(waypoint.name, INITIAL_WAYPOINT);
        assert_eq!(waypoint.values.len(), 7);
        assert_eq!(waypoint.get(MotorAddress(second)), Some(angle));
        let others: Vec<f32> = waypoint
            .values
            .iter()
            .filter(|(k, _)| **k != second.to_string())
            .map(|(_, v)| *v)
            .collect();
        assert!(others.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_ascending_merge_derives_descending_pair() {
        let left = sequence("left_up", Side::Left, &["p1", "p2", "p3"]);
        let right = sequence("right_up", Side::Right, &["q1", "q2", "q3"]);

        let outcome = merge(&left, &right, "UP_to_rest", None).unwrap();
        assert_eq!(outcome.direction, MergeDirection::Ascending);
        assert_eq!(outcome.arm_model, ArmModel::Old);

        let up = &outcome.primary.sequences;
        assert_eq!(
            names(up.left().unwrap()),
            vec![INITIAL_WAYPOINT, "p1", "p2", "p3"]
        );
        assert_eq!(
            names(up.right().unwrap()),
            vec![INITIAL_WAYPOINT, "q1", "q2", "q3"]
        );

        let down = outcome.derived_descending.unwrap();
        assert_eq!(down.name, "DOWN_to_rest");
        assert_eq!(down.file_name, "DOWN_to_rest");
        let down_left = down.sequences.left().unwrap();
        assert_eq!(down_left.name, "left_down");
        assert_eq!(names(down_left), vec!["p2", "p1", INITIAL_WAYPOINT]);
        assert_eq!(
            names(down.sequences.right().unwrap()),
            vec!["q2", "q1", INITIAL_WAYPOINT]
        );
    }

    #[test]
    fn test_mixed_case_up_keeps_ascending_pair_only() {
        let left = sequence("l", Side::Left, &["p1", "p2"]);
        let right = sequence("r", Side::Right, &["q1", "q2"]);

        let outcome = merge(&left, &right, "pickuP", None).unwrap();
        assert_eq!(outcome.direction, MergeDirection::Ascending);
        assert!(outcome.derived_descending.is_none());
        assert_eq!(outcome.primary.file_name, "pickuP");
        assert_eq!(
            names(outcome.primary.sequences.left().unwrap()),
            vec![INITIAL_WAYPOINT, "p1", "p2"]
        );
    }

    #[test]
    fn test_descending_merge_mirrors_without_rest_point() {
        let left = sequence("l", Side::Left, &["a", "b", "c"]);
        let right = sequence("r", Side::Right, &["x"]);

        let outcome = merge(&right, &left, "arm_down", Some(ArmModel::New)).unwrap();
        assert_eq!(outcome.direction, MergeDirection::Descending);
        assert!(outcome.derived_descending.is_none());

        let pair = &outcome.primary.sequences;
        assert_eq!(pair.joint_sequences[0].side, Side::Left);
        assert_eq!(names(pair.left().unwrap()), vec!["b", "a"]);
        // Single way-point sequences are kept as they are
        assert_eq!(names(pair.right().unwrap()), vec!["x"]);
        assert!(pair
            .joint_sequences
            .iter()
            .all(|s| s.arm_model == Some(ArmModel::New)));
    }

    #[test]
    fn test_plain_merge_keeps_sequences_verbatim() {
        let mut left = sequence("l", Side::Left, &["a", "b"]);
        left.arm_model = Some(ArmModel::New);
        let right = sequence("r", Side::Right, &["x", "y", "z"]);

        let outcome = merge(&left, &right, "wave", None).unwrap();
        assert_eq!(outcome.direction, MergeDirection::Plain);
        assert_eq!(outcome.arm_model, ArmModel::New);
        assert_eq!(outcome.primary.sequences.left().unwrap().angles, left.angles);
        assert_eq!(
            outcome.primary.sequences.right().unwrap().angles,
            right.angles
        );
    }

    #[test]
    fn test_same_side_merge_rejected() {
        let a = sequence("a", Side::Left, &["p"]);
        let b = sequence("b", Side::Left, &["q"]);
        assert!(matches!(
            merge(&a, &b, "pair_up", None),
            Err(SequenceError::SideMismatch(_))
        ));
    }
}
