//! Scripted execution of a merged up/down file
//!
//! Ascending files bring both arms up from rest:
//!
//! ```text
//! hands anti-collision -> clear faults -> enable -> speeds -> play -> hands release
//! ```
//!
//! Descending files bring them back down:
//!
//! ```text
//! hands anti-collision -> speeds -> play -> disable -> clear faults
//! ```
//!
//! Both arms run each step together. A failed step is logged and recorded
//! in the report; the routine always runs to the end.

use std::time::Duration;

use canarm_core::{ControlError, ControlResult, MergedSequences, Side};
use canarm_seq::MergeDirection;
use serde::Serialize;
use tokio::time::sleep;

use crate::config::RoutineConfig;
use crate::dispatcher::CommandDispatcher;
use crate::gripper::{GripperController, HandFamily, HandProfile, HandProfiles};
use crate::playback::{play_pair, PlaybackReport, SequencePlayer};

/// One arm with its optional hand
#[derive(Debug, Clone)]
pub struct ArmUnit {
    pub dispatcher: CommandDispatcher,
    pub hand: Option<GripperController>,
}

impl ArmUnit {
    pub fn new(dispatcher: CommandDispatcher, hand: Option<GripperController>) -> Self {
        Self { dispatcher, hand }
    }

    fn hand(&self) -> ControlResult<&GripperController> {
        self.hand.as_ref().ok_or_else(|| {
            ControlError::NotFound(format!(
                "no hand configured for the {} arm",
                self.dispatcher.manipulator().side()
            ))
        })
    }
}

/// Outcome of one step on one side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineStep {
    pub step: &'static str,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a routine run did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineReport {
    pub file_name: String,
    pub direction: MergeDirection,
    pub steps: Vec<RoutineStep>,
    pub playback: Vec<PlaybackReport>,
}

impl RoutineReport {
    fn record<T>(&mut self, step: &'static str, side: Side, result: ControlResult<T>) {
        let error = match result {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(step, side = %side, error = %e, "Routine step failed");
                Some(e.to_string())
            }
        };
        self.steps.push(RoutineStep { step, side, error });
    }

    /// Steps that failed
    pub fn failures(&self) -> impl Iterator<Item = &RoutineStep> {
        self.steps.iter().filter(|s| s.error.is_some())
    }

    /// No step failed and every way-point write went through
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none() && self.playback.iter().all(PlaybackReport::is_clean)
    }
}

/// Runs merged files on a left and a right arm
#[derive(Debug, Clone)]
pub struct MergedRoutine {
    left: ArmUnit,
    right: ArmUnit,
    profiles: HandProfiles,
    config: RoutineConfig,
}

impl MergedRoutine {
    pub fn new(left: ArmUnit, right: ArmUnit, profiles: HandProfiles, config: RoutineConfig) -> Self {
        Self {
            left,
            right,
            profiles,
            config,
        }
    }

    /// Run `pair`; `file_name` decides direction and hand family
    ///
    /// Fails before any bus traffic if the name has no direction or the
    /// file does not hold both sides.
    pub async fn run(&self, file_name: &str, pair: &MergedSequences) -> ControlResult<RoutineReport> {
        let direction = MergeDirection::from_name(file_name);
        if direction == MergeDirection::Plain {
            return Err(ControlError::ConfigMismatch(format!(
                "{} names neither an up nor a down routine",
                file_name
            )));
        }
        if !pair.is_pair() {
            return Err(ControlError::NotFound(format!(
                "{} does not hold a left and a right sequence",
                file_name
            )));
        }

        tracing::info!(file = file_name, ?direction, "Running merged routine");
        let mut report = RoutineReport {
            file_name: file_name.to_string(),
            direction,
            steps: Vec::new(),
            playback: Vec::new(),
        };

        match direction {
            MergeDirection::Ascending => {
                self.hands_anti_collision(&mut report).await;
                self.pause(self.config.hand_settle_ms).await;
                self.clear_faults(&mut report).await;
                self.pause(self.config.clear_settle_ms).await;
                self.enable(&mut report).await;
                self.pause(self.config.enable_settle_ms).await;
                self.speeds(&mut report).await;
                self.pause(self.config.speed_settle_ms).await;
                self.play(pair, &mut report).await;
                self.hands_release(HandFamily::from_file_name(file_name), &mut report)
                    .await;
            }
            MergeDirection::Descending | MergeDirection::Plain => {
                self.hands_anti_collision(&mut report).await;
                self.pause(self.config.hand_settle_ms).await;
                self.speeds(&mut report).await;
                self.pause(self.config.speed_settle_ms).await;
                self.play(pair, &mut report).await;
                self.disable(&mut report).await;
                self.pause(self.config.disable_settle_ms).await;
                self.clear_faults(&mut report).await;
            }
        }

        tracing::info!(
            file = file_name,
            failed_steps = report.failures().count(),
            "Merged routine finished"
        );
        Ok(report)
    }

    async fn pause(&self, millis: u64) {
        sleep(Duration::from_millis(millis)).await;
    }

    async fn hands_anti_collision(&self, report: &mut RoutineReport) {
        let anti_collision = |unit: &ArmUnit| {
            let hand = unit.hand().cloned();
            let profiles = &self.profiles;
            async move {
                match hand {
                    Ok(hand) => hand.anti_collision(profiles).await,
                    Err(e) => Err(e),
                }
            }
        };
        let (left, right) = tokio::join!(anti_collision(&self.left), anti_collision(&self.right));
        report.record("hands_anti_collision", Side::Left, left);
        report.record("hands_anti_collision", Side::Right, right);
    }

    async fn hands_release(&self, family: HandFamily, report: &mut RoutineReport) {
        let release = |unit: &ArmUnit| {
            let hand = unit.hand().cloned();
            let profiles = &self.profiles;
            async move {
                match hand {
                    Ok(hand) => hand.apply_profile(profiles, family, HandProfile::Release).await,
                    Err(e) => Err(e),
                }
            }
        };
        let (left, right) = tokio::join!(release(&self.left), release(&self.right));
        report.record("hands_release", Side::Left, left);
        report.record("hands_release", Side::Right, right);
    }

    async fn clear_faults(&self, report: &mut RoutineReport) {
        let (left, right) = tokio::join!(
            self.left.dispatcher.clear_faults(),
            self.right.dispatcher.clear_faults()
        );
        report.record("clear_faults", Side::Left, left);
        report.record("clear_faults", Side::Right, right);
    }

    async fn enable(&self, report: &mut RoutineReport) {
        let (left, right) = tokio::join!(
            self.left.dispatcher.enable_all(),
            self.right.dispatcher.enable_all()
        );
        report.record("enable", Side::Left, left);
        report.record("enable", Side::Right, right);
    }

    async fn disable(&self, report: &mut RoutineReport) {
        let (left, right) = tokio::join!(
            self.left.dispatcher.disable_all(),
            self.right.dispatcher.disable_all()
        );
        report.record("disable", Side::Left, left);
        report.record("disable", Side::Right, right);
    }

    async fn speeds(&self, report: &mut RoutineReport) {
        let speed = self.config.speed;
        let (left, right) = tokio::join!(
            self.left.dispatcher.set_uniform_speed(speed),
            self.right.dispatcher.set_uniform_speed(speed)
        );
        report.record("speeds", Side::Left, left);
        report.record("speeds", Side::Right, right);
    }

    async fn play(&self, pair: &MergedSequences, report: &mut RoutineReport) {
        let left = SequencePlayer::new(self.left.dispatcher.clone(), self.config.playback());
        let right = SequencePlayer::new(self.right.dispatcher.clone(), self.config.playback());

        let (left_handle, right_handle) = match play_pair(&left, &right, pair) {
            Ok(handles) => handles,
            Err(e) => {
                report.record::<()>("play", Side::Left, Err(e.clone()));
                report.record::<()>("play", Side::Right, Err(e));
                return;
            }
        };

        let (left_result, right_result) = tokio::join!(left_handle.wait(), right_handle.wait());
        for (side, result) in [(Side::Left, left_result), (Side::Right, right_result)] {
            match result {
                Ok(playback) => {
                    report.record::<()>("play", side, Ok(()));
                    report.playback.push(playback);
                }
                Err(e) => report.record::<()>("play", side, Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gripper::{AntiCollision, FamilyProfiles, HandAddress, SideProfiles};
    use canarm_bridge::{BusTransport, MockBus};
    use canarm_codec::constants::command;
    use canarm_codec::{motor_from_identifier, CanFrame};
    use canarm_core::{ArmModel, JointAngleSet, JointSequence, Manipulator};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn unit(bus: &Arc<MockBus>, iface: &str, side: Side, with_hand: bool) -> ArmUnit {
        let transport: Arc<dyn BusTransport> = bus.clone();
        let arm = Arc::new(Manipulator::for_side(iface, side).unwrap());
        let hand = with_hand.then(|| {
            GripperController::new(
                transport.clone(),
                iface,
                HandAddress::from_config(side, ""),
            )
        });
        ArmUnit::new(CommandDispatcher::new(transport, arm), hand)
    }

    fn profiles() -> HandProfiles {
        let side = SideProfiles {
            press: vec![200; 6],
            release: vec![10; 6],
            ..Default::default()
        };
        HandProfiles {
            sks: FamilyProfiles {
                left: side.clone(),
                right: side.clone(),
            },
            sn: FamilyProfiles {
                left: SideProfiles {
                    release: vec![20; 6],
                    ..side.clone()
                },
                right: SideProfiles {
                    release: vec![20; 6],
                    ..side
                },
            },
            anti_collision: AntiCollision {
                left: vec![0, 90, 0, 0, 0, 0],
                right: vec![0, 90, 0, 0, 0, 0],
            },
        }
    }

    fn pair(name: &str) -> MergedSequences {
        let mut left = JointSequence::new(name, Side::Left, Some(ArmModel::Old));
        left.angles = vec![
            JointAngleSet::new("initial").with(61u8, 0.0),
            JointAngleSet::new("p1").with(61u8, 0.5),
        ];
        let mut right = JointSequence::new(name, Side::Right, Some(ArmModel::Old));
        right.angles = vec![JointAngleSet::new("p1").with(51u8, -0.5)];
        MergedSequences::new(vec![left, right])
    }

    fn routine(bus: &Arc<MockBus>, hands: bool) -> MergedRoutine {
        MergedRoutine::new(
            unit(bus, "can0", Side::Left, hands),
            unit(bus, "can1", Side::Right, hands),
            profiles(),
            RoutineConfig::default(),
        )
    }

    /// Command kind of a frame: hand pose, or motor command byte
    fn kinds(frames: &[CanFrame], iface: &str) -> Vec<String> {
        let mut kinds: Vec<String> = Vec::new();
        for frame in frames.iter().filter(|f| f.interface == iface) {
            let kind = if !frame.extended {
                format!("hand:{}", frame.data[1..].iter().map(|b| b.to_string()).collect::<Vec<_>>().join(","))
            } else {
                let cmd = (frame.id >> 24) as u8;
                match (cmd, frame.data[0], frame.data[1]) {
                    (command::STOP, 1, _) => "clear".to_string(),
                    (command::STOP, _, _) => "disable".to_string(),
                    (command::ENABLE, _, _) => "enable".to_string(),
                    (command::WRITE_PARAMETER, 0x05, 0x70) => "mode".to_string(),
                    (command::WRITE_PARAMETER, 0x24, 0x70) => "speed".to_string(),
                    (command::WRITE_PARAMETER, 0x16, 0x70) => {
                        format!("angle:{}", motor_from_identifier(frame.id))
                    }
                    _ => "other".to_string(),
                }
            };
            if kinds.last() != Some(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    #[tokio::test(start_paused = true)]
    async fn test_ascending_routine_order() {
        let bus = Arc::new(MockBus::scripted());
        let report = routine(&bus, true)
            .run("lift_sks_up.json", &pair("lift up"))
            .await
            .unwrap();

        assert!(report.is_clean(), "{:?}", report);
        assert_eq!(report.direction, MergeDirection::Ascending);
        assert_eq!(report.playback.len(), 2);

        let left = kinds(&bus.sent(), "can0");
        let n = left.len();
        assert_eq!(left[0], "hand:0,90,0,0,0,0");
        assert_eq!(left[1], "clear");
        // Mode and enable frames interleave across joints
        assert!(left[2..n - 3].iter().all(|k| k == "mode" || k == "enable"));
        assert_eq!(left[n - 4], "enable");
        assert_eq!(
            &left[n - 3..],
            &["speed", "angle:61", "hand:10,10,10,10,10,10"][..]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_descending_routine_order() {
        let bus = Arc::new(MockBus::scripted());
        let report = routine(&bus, true)
            .run("lift_down.json", &pair("lift down"))
            .await
            .unwrap();
        assert!(report.is_clean());

        let right = kinds(&bus.sent(), "can1");
        assert_eq!(
            right,
            vec!["hand:0,90,0,0,0,0", "speed", "angle:51", "disable", "clear"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_hands_are_recorded_not_fatal() {
        let bus = Arc::new(MockBus::scripted());
        let report = routine(&bus, false)
            .run("lift_up.json", &pair("lift up"))
            .await
            .unwrap();

        let failed: Vec<(&str, Side)> = report.failures().map(|s| (s.step, s.side)).collect();
        assert_eq!(
            failed,
            vec![
                ("hands_anti_collision", Side::Left),
                ("hands_anti_collision", Side::Right),
                ("hands_release", Side::Left),
                ("hands_release", Side::Right),
            ]
        );
        assert_eq!(report.playback.len(), 2);
        assert!(bus.sent().iter().all(|f| f.extended));
    }

    #[tokio::test]
    async fn test_rejected_before_any_traffic() {
        let bus = Arc::new(MockBus::scripted());
        let routine = routine(&bus, true);
        assert!(matches!(
            routine.run("lift.json", &pair("lift")).await,
            Err(ControlError::ConfigMismatch(_))
        ));

        let mut single = pair("lift up");
        single.joint_sequences.pop();
        assert!(matches!(
            routine.run("lift_up.json", &single).await,
            Err(ControlError::NotFound(_))
        ));
        assert!(bus.sent().is_empty());
    }
}
