//! Command dispatcher
//!
//! Turns joint-level requests into motor frames and sends them through a
//! [`BusTransport`]. Single-joint operations validate the address before any
//! traffic; whole-manipulator operations fan out one task per joint.
//!
//! The dispatcher keeps no motor state: every call maps directly to frames.

use std::sync::Arc;

use canarm_bridge::BusTransport;
use canarm_codec::{build_write_frame, MotorCommand, RegisterIndex};
use canarm_core::{ControlError, ControlResult, Manipulator, MotorAddress};

use crate::fanout::fan_out;

/// Sends motor commands for one manipulator
#[derive(Clone)]
pub struct CommandDispatcher {
    transport: Arc<dyn BusTransport>,
    manipulator: Arc<Manipulator>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("manipulator", &self.manipulator)
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    pub fn new(transport: Arc<dyn BusTransport>, manipulator: Arc<Manipulator>) -> Self {
        Self {
            transport,
            manipulator,
        }
    }

    pub fn manipulator(&self) -> &Arc<Manipulator> {
        &self.manipulator
    }

    pub fn transport(&self) -> &Arc<dyn BusTransport> {
        &self.transport
    }

    async fn send(&self, motor: MotorAddress, command: MotorCommand) -> ControlResult<()> {
        let frame = build_write_frame(self.manipulator.interface(), motor.id(), &command);
        tracing::debug!(
            iface = %frame.interface,
            motor = %motor,
            id = frame.id,
            command = ?command,
            "Sending motor frame"
        );
        self.transport.send(&frame).await?;
        Ok(())
    }

    /// Position-profile mode then drive enable, in that order
    async fn enable_motor(&self, motor: MotorAddress) -> ControlResult<()> {
        self.send(motor, MotorCommand::position_profile_mode()).await?;
        self.send(motor, MotorCommand::Enable).await
    }

    /// Spawn one `command` per motor and wait for all of them
    async fn fan_out_command<F>(&self, motors: Vec<MotorAddress>, command: F) -> ControlResult<()>
    where
        F: Fn(MotorAddress) -> MotorCommand,
    {
        fan_out(motors, |motor| {
            let this = self.clone();
            let command = command(motor);
            async move { this.send(motor, command).await }
        })
        .await
    }

    fn check_arity(&self, what: &str, supplied: usize) -> ControlResult<()> {
        if supplied != self.manipulator.len() {
            return Err(ControlError::Encoding(format!(
                "{} {} values for {} joints on {}",
                what,
                supplied,
                self.manipulator.len(),
                self.manipulator.interface()
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Single joint
    // =========================================================================

    /// Move one joint to `radians`
    pub async fn set_angle(&self, motor: MotorAddress, radians: f32) -> ControlResult<()> {
        let motor = self.manipulator.validate(motor)?;
        self.send(motor, MotorCommand::target_angle(radians)).await
    }

    /// Set one joint's speed limit
    pub async fn set_speed(&self, motor: MotorAddress, speed: f32) -> ControlResult<()> {
        let motor = self.manipulator.validate(motor)?;
        self.send(motor, MotorCommand::speed_limit(speed)).await
    }

    /// Write one of the four controller gains
    pub async fn set_gain(
        &self,
        motor: MotorAddress,
        gain: RegisterIndex,
        value: f32,
    ) -> ControlResult<()> {
        let motor = self.manipulator.validate(motor)?;
        if !RegisterIndex::GAINS.contains(&gain) {
            return Err(ControlError::Encoding(format!("{} is not a gain register", gain)));
        }
        self.send(motor, MotorCommand::register(gain, value)).await
    }

    pub async fn enable(&self, motor: MotorAddress) -> ControlResult<()> {
        let motor = self.manipulator.validate(motor)?;
        self.enable_motor(motor).await
    }

    pub async fn disable(&self, motor: MotorAddress) -> ControlResult<()> {
        let motor = self.manipulator.validate(motor)?;
        self.send(motor, MotorCommand::Disable).await
    }

    pub async fn clear_fault(&self, motor: MotorAddress) -> ControlResult<()> {
        let motor = self.manipulator.validate(motor)?;
        self.send(motor, MotorCommand::ClearFault).await
    }

    /// Drive one joint back to angle 0
    pub async fn return_zero(&self, motor: MotorAddress) -> ControlResult<()> {
        self.set_angle(motor, 0.0).await
    }

    // =========================================================================
    // Whole manipulator
    // =========================================================================

    /// One angle per joint, in joint order
    pub async fn set_all_angles(&self, angles: &[f32]) -> ControlResult<()> {
        self.check_arity("got", angles.len())?;
        let targets: Vec<(MotorAddress, f32)> = self
            .manipulator
            .motors()
            .iter()
            .copied()
            .zip(angles.iter().copied())
            .collect();
        fan_out(targets, |(motor, angle)| {
            let this = self.clone();
            async move { this.send(motor, MotorCommand::target_angle(angle)).await }
        })
        .await
    }

    /// One speed limit per joint, in joint order
    pub async fn set_all_speeds(&self, speeds: &[f32]) -> ControlResult<()> {
        self.check_arity("got", speeds.len())?;
        let targets: Vec<(MotorAddress, f32)> = self
            .manipulator
            .motors()
            .iter()
            .copied()
            .zip(speeds.iter().copied())
            .collect();
        fan_out(targets, |(motor, speed)| {
            let this = self.clone();
            async move { this.send(motor, MotorCommand::speed_limit(speed)).await }
        })
        .await
    }

    /// Same speed limit on every joint
    pub async fn set_uniform_speed(&self, speed: f32) -> ControlResult<()> {
        self.set_all_speeds(&vec![speed; self.manipulator.len()])
            .await
    }

    /// Mark the current position as zero
    ///
    /// `None` or an empty subset means every joint. Addresses that are not
    /// part of the manipulator are skipped with a warning.
    pub async fn set_zero(&self, subset: Option<&[MotorAddress]>) -> ControlResult<()> {
        let motors: Vec<MotorAddress> = match subset {
            Some(requested) if !requested.is_empty() => requested
                .iter()
                .copied()
                .filter(|motor| {
                    let known = self.manipulator.contains(*motor);
                    if !known {
                        tracing::warn!(
                            iface = %self.manipulator.interface(),
                            motor = %motor,
                            "Skipping set-zero for unknown motor"
                        );
                    }
                    known
                })
                .collect(),
            _ => self.manipulator.motors().to_vec(),
        };
        self.fan_out_command(motors, |_| MotorCommand::SetZero).await
    }

    pub async fn enable_all(&self) -> ControlResult<()> {
        tracing::info!(iface = %self.manipulator.interface(), "Enabling all joints");
        fan_out(self.manipulator.motors().to_vec(), |motor| {
            let this = self.clone();
            async move { this.enable_motor(motor).await }
        })
        .await
    }

    pub async fn disable_all(&self) -> ControlResult<()> {
        tracing::info!(iface = %self.manipulator.interface(), "Disabling all joints");
        self.fan_out_command(self.manipulator.motors().to_vec(), |_| MotorCommand::Disable)
            .await
    }

    pub async fn clear_faults(&self) -> ControlResult<()> {
        tracing::info!(iface = %self.manipulator.interface(), "Clearing faults");
        self.fan_out_command(self.manipulator.motors().to_vec(), |_| {
            MotorCommand::ClearFault
        })
        .await
    }

    pub async fn return_all_to_zero(&self) -> ControlResult<()> {
        self.set_all_angles(&vec![0.0; self.manipulator.len()])
            .await
    }
}
