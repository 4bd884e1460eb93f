//! Sequence playback
//!
//! Playback writes each way-point's angles and pauses between way-points.
//! A failed joint write is recorded in the report and playback carries on.
//! Spawned playback runs in the background; the returned handle is the only
//! way to wait for it or stop it.

use canarm_core::{ControlError, ControlResult, JointSequence, MergedSequences, MotorAddress, Side};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

use crate::config::PlaybackConfig;
use crate::dispatcher::CommandDispatcher;

/// One joint write that failed during playback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackFailure {
    pub waypoint: String,
    /// Way-point key as recorded (may not be a valid motor id)
    pub motor: String,
    pub error: String,
}

/// Result of playing one sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackReport {
    pub sequence: String,
    pub interface: String,
    pub waypoints: usize,
    /// Joint writes that reached the bridge
    pub commands_sent: usize,
    pub failures: Vec<PlaybackFailure>,
}

impl PlaybackReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Plays sequences on one manipulator
#[derive(Debug, Clone)]
pub struct SequencePlayer {
    dispatcher: CommandDispatcher,
    config: PlaybackConfig,
}

impl SequencePlayer {
    pub fn new(dispatcher: CommandDispatcher, config: PlaybackConfig) -> Self {
        Self { dispatcher, config }
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Reject sequences recorded for the other arm
    fn check_side(&self, sequence: &JointSequence) -> ControlResult<()> {
        let arm_side = self.dispatcher.manipulator().side();
        if sequence.side != Side::Unknown && arm_side != Side::Unknown && sequence.side != arm_side {
            return Err(ControlError::ConfigMismatch(format!(
                "sequence {} was recorded for the {} arm, {} is the {} arm",
                sequence.name,
                sequence.side,
                self.dispatcher.manipulator().interface(),
                arm_side
            )));
        }
        Ok(())
    }

    /// Play `sequence` to the end on the current task
    pub async fn play(&self, sequence: &JointSequence) -> ControlResult<PlaybackReport> {
        self.check_side(sequence)?;
        Ok(self.run(sequence).await)
    }

    /// Play `sequence` in the background
    pub fn spawn(&self, sequence: JointSequence) -> ControlResult<PlaybackHandle> {
        self.check_side(&sequence)?;
        let id = Uuid::new_v4();
        let name = sequence.name.clone();
        let interface = self.dispatcher.manipulator().interface().to_string();
        let player = self.clone();
        let handle = tokio::spawn(async move { player.run(&sequence).await });
        tracing::info!(%id, sequence = %name, iface = %interface, "Started playback");
        Ok(PlaybackHandle {
            id,
            sequence: name,
            interface,
            handle,
        })
    }

    async fn run(&self, sequence: &JointSequence) -> PlaybackReport {
        let interface = self.dispatcher.manipulator().interface().to_string();
        let mut report = PlaybackReport {
            sequence: sequence.name.clone(),
            interface: interface.clone(),
            waypoints: sequence.angles.len(),
            commands_sent: 0,
            failures: Vec::new(),
        };

        for waypoint in &sequence.angles {
            tracing::debug!(iface = %interface, waypoint = %waypoint.name, "Playing way-point");
            for (key, angle) in &waypoint.values {
                let result = match key.parse::<MotorAddress>() {
                    Ok(motor) => self.dispatcher.set_angle(motor, *angle).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(()) => report.commands_sent += 1,
                    Err(e) => {
                        tracing::warn!(
                            iface = %interface,
                            waypoint = %waypoint.name,
                            motor = %key,
                            error = %e,
                            "Way-point write failed"
                        );
                        report.failures.push(PlaybackFailure {
                            waypoint: waypoint.name.clone(),
                            motor: key.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            sleep(self.config.waypoint_delay()).await;
        }

        tracing::info!(
            iface = %interface,
            sequence = %sequence.name,
            sent = report.commands_sent,
            failed = report.failures.len(),
            "Playback finished"
        );
        report
    }
}

/// Background playback of one sequence
#[derive(Debug)]
pub struct PlaybackHandle {
    id: Uuid,
    sequence: String,
    interface: String,
    handle: JoinHandle<PlaybackReport>,
}

impl PlaybackHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the playback; way-points already written stay written
    pub fn abort(&self) {
        tracing::info!(id = %self.id, sequence = %self.sequence, "Aborting playback");
        self.handle.abort();
    }

    /// Wait for the playback to end
    pub async fn wait(self) -> ControlResult<PlaybackReport> {
        self.handle.await.map_err(|e| {
            ControlError::Transport(format!("playback of {} did not complete: {}", self.sequence, e))
        })
    }
}

/// Start both sides of a merged pair, each on its own player
///
/// Both sequences are checked before either starts.
pub fn play_pair(
    left: &SequencePlayer,
    right: &SequencePlayer,
    pair: &MergedSequences,
) -> ControlResult<(PlaybackHandle, PlaybackHandle)> {
    let left_sequence = pair
        .left()
        .ok_or_else(|| ControlError::NotFound("left sequence in merged file".into()))?;
    let right_sequence = pair
        .right()
        .ok_or_else(|| ControlError::NotFound("right sequence in merged file".into()))?;
    left.check_side(left_sequence)?;
    right.check_side(right_sequence)?;

    let left_handle = left.spawn(left_sequence.clone())?;
    let right_handle = right.spawn(right_sequence.clone())?;
    Ok((left_handle, right_handle))
}
