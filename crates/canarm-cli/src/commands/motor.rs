//! Joint commands - enable, disable, faults, zeroing and set-points

use anyhow::Result;
use canarm_codec::RegisterIndex;
use canarm_control::ControlService;
use canarm_core::{CommandOutcome, MotorAddress};

use crate::output::OutputContext;

/// Per-joint action that can also target the whole arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointAction {
    Enable,
    Disable,
    ClearFault,
    ReturnZero,
}

impl JointAction {
    fn label(self) -> &'static str {
        match self {
            JointAction::Enable => "Enable",
            JointAction::Disable => "Disable",
            JointAction::ClearFault => "Clear fault",
            JointAction::ReturnZero => "Return to zero",
        }
    }
}

fn target(interface: &str, motor: Option<u8>) -> String {
    match motor {
        Some(m) => format!("motor {} on {}", m, interface),
        None => format!("all joints on {}", interface),
    }
}

/// Run `action` on one motor, or on every joint when `motor` is `None`
pub async fn joint_action(
    service: &ControlService,
    interface: &str,
    motor: Option<u8>,
    action: JointAction,
    ctx: &OutputContext,
) -> Result<()> {
    let dispatcher = service.dispatcher(interface)?;

    let result = match (action, motor.map(MotorAddress)) {
        (JointAction::Enable, Some(m)) => dispatcher.enable(m).await,
        (JointAction::Enable, None) => dispatcher.enable_all().await,
        (JointAction::Disable, Some(m)) => dispatcher.disable(m).await,
        (JointAction::Disable, None) => dispatcher.disable_all().await,
        (JointAction::ClearFault, Some(m)) => dispatcher.clear_fault(m).await,
        (JointAction::ClearFault, None) => dispatcher.clear_faults().await,
        (JointAction::ReturnZero, Some(m)) => dispatcher.return_zero(m).await,
        (JointAction::ReturnZero, None) => dispatcher.return_all_to_zero().await,
    };

    let action = format!("{} {}", action.label(), target(interface, motor));
    ctx.outcome(&CommandOutcome::from_result(&action, result))
}

/// Mark the current position of `motors` (or every joint) as zero
pub async fn set_zero(
    service: &ControlService,
    interface: &str,
    motors: &[u8],
    ctx: &OutputContext,
) -> Result<()> {
    let dispatcher = service.dispatcher(interface)?;
    let addresses: Vec<MotorAddress> = motors.iter().copied().map(MotorAddress).collect();

    let result = if addresses.is_empty() {
        dispatcher.set_zero(None).await
    } else {
        dispatcher.set_zero(Some(&addresses)).await
    };

    let action = if motors.is_empty() {
        format!("Set zero on all joints of {}", interface)
    } else {
        format!("Set zero on {} joint(s) of {}", motors.len(), interface)
    };
    ctx.outcome(&CommandOutcome::from_result(&action, result))
}

/// Set the target angle of one joint
pub async fn set_angle(
    service: &ControlService,
    interface: &str,
    motor: u8,
    angle: f32,
    ctx: &OutputContext,
) -> Result<()> {
    let result = service
        .dispatcher(interface)?
        .set_angle(MotorAddress(motor), angle)
        .await;
    let action = format!("Set angle {} on {}", angle, target(interface, Some(motor)));
    ctx.outcome(&CommandOutcome::from_result(&action, result))
}

/// Set the speed limit of one joint
pub async fn set_speed(
    service: &ControlService,
    interface: &str,
    motor: u8,
    speed: f32,
    ctx: &OutputContext,
) -> Result<()> {
    let result = service
        .dispatcher(interface)?
        .set_speed(MotorAddress(motor), speed)
        .await;
    let action = format!("Set speed {} on {}", speed, target(interface, Some(motor)));
    ctx.outcome(&CommandOutcome::from_result(&action, result))
}

/// Write one controller gain of one joint
pub async fn set_gain(
    service: &ControlService,
    interface: &str,
    motor: u8,
    register: RegisterIndex,
    value: f32,
    ctx: &OutputContext,
) -> Result<()> {
    let result = service
        .dispatcher(interface)?
        .set_gain(MotorAddress(motor), register, value)
        .await;
    let action = format!(
        "Set {} = {} on {}",
        register.name(),
        value,
        target(interface, Some(motor))
    );
    ctx.outcome(&CommandOutcome::from_result(&action, result))
}

/// Set every joint angle in joint order
pub async fn set_angles(
    service: &ControlService,
    interface: &str,
    angles: &[f32],
    ctx: &OutputContext,
) -> Result<()> {
    let result = service.dispatcher(interface)?.set_all_angles(angles).await;
    let action = format!("Set {} angle(s) on {}", angles.len(), interface);
    ctx.outcome(&CommandOutcome::from_result(&action, result))
}

/// Set every joint speed limit; a single value applies to all joints
pub async fn set_speeds(
    service: &ControlService,
    interface: &str,
    speeds: &[f32],
    ctx: &OutputContext,
) -> Result<()> {
    let dispatcher = service.dispatcher(interface)?;
    let result = match speeds {
        [speed] => dispatcher.set_uniform_speed(*speed).await,
        _ => dispatcher.set_all_speeds(speeds).await,
    };
    let action = format!("Set {} speed(s) on {}", speeds.len(), interface);
    ctx.outcome(&CommandOutcome::from_result(&action, result))
}
