//! Control service: the registry, transport and hands in one place
//!
//! Builds the per-manipulator components on demand. Nothing is cached per
//! call, so a service can be shared freely between tasks.

use std::collections::BTreeMap;
use std::sync::Arc;

use canarm_bridge::BusTransport;
use canarm_core::{ControlError, ControlResult, JointAngleSet, ManipulatorRegistry, Side};

use crate::config::ControlConfig;
use crate::dispatcher::CommandDispatcher;
use crate::feedback::{FeedbackEngine, FeedbackSnapshot};
use crate::gripper::{GripperController, HandConfig};
use crate::playback::SequencePlayer;
use crate::routine::{ArmUnit, MergedRoutine};

pub struct ControlService {
    transport: Arc<dyn BusTransport>,
    registry: ManipulatorRegistry,
    hands: BTreeMap<Side, GripperController>,
    config: ControlConfig,
}

impl ControlService {
    pub fn new(
        transport: Arc<dyn BusTransport>,
        registry: ManipulatorRegistry,
        hands: &BTreeMap<Side, HandConfig>,
        config: ControlConfig,
    ) -> Self {
        let hands = GripperController::from_config(transport.clone(), hands);
        Self {
            transport,
            registry,
            hands,
            config,
        }
    }

    pub fn registry(&self) -> &ManipulatorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn dispatcher(&self, interface: &str) -> ControlResult<CommandDispatcher> {
        Ok(CommandDispatcher::new(
            self.transport.clone(),
            self.registry.get(interface)?,
        ))
    }

    pub fn feedback(&self, interface: &str) -> ControlResult<FeedbackEngine> {
        Ok(
            FeedbackEngine::new(self.transport.clone(), self.registry.get(interface)?)
                .with_timing(self.config.feedback),
        )
    }

    pub fn player(&self, interface: &str) -> ControlResult<SequencePlayer> {
        Ok(SequencePlayer::new(
            self.dispatcher(interface)?,
            self.config.playback,
        ))
    }

    /// Player for the arm on `side`
    pub fn player_for_side(&self, side: Side) -> ControlResult<SequencePlayer> {
        let manipulator = self.registry.by_side(side).ok_or_else(|| {
            ControlError::NotFound(format!("no {} arm configured", side))
        })?;
        Ok(SequencePlayer::new(
            CommandDispatcher::new(self.transport.clone(), manipulator),
            self.config.playback,
        ))
    }

    pub fn hand(&self, side: Side) -> ControlResult<&GripperController> {
        self.hands
            .get(&side)
            .ok_or_else(|| ControlError::NotFound(format!("no {} hand configured", side)))
    }

    /// Routine over the left and right arms and whatever hands exist
    pub fn routine(&self) -> ControlResult<MergedRoutine> {
        let unit = |side: Side| -> ControlResult<ArmUnit> {
            let manipulator = self.registry.by_side(side).ok_or_else(|| {
                ControlError::NotFound(format!("no {} arm configured", side))
            })?;
            Ok(ArmUnit::new(
                CommandDispatcher::new(self.transport.clone(), manipulator),
                self.hands.get(&side).cloned(),
            ))
        };
        Ok(MergedRoutine::new(
            unit(Side::Left)?,
            unit(Side::Right)?,
            self.config.hand_profiles.clone(),
            self.config.routine,
        ))
    }

    /// Read the arm and turn the settled angles into a way-point
    ///
    /// Joints that did not settle are absent from the way-point.
    pub async fn capture_waypoint(
        &self,
        interface: &str,
        name: &str,
    ) -> ControlResult<(JointAngleSet, FeedbackSnapshot)> {
        let snapshot = self.feedback(interface)?.query().await?;
        let mut waypoint = JointAngleSet::new(name);
        for (motor, angle) in &snapshot.angles {
            waypoint.set(*motor, *angle);
        }
        Ok((waypoint, snapshot))
    }
}
