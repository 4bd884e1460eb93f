//! Recording commands - capture way-points and finish sequences

use anyhow::Result;
use canarm_control::ControlService;
use canarm_core::{ArmModel, CommandOutcome, JointAngleSet, MotorAddress};
use canarm_seq::SequenceStore;

use crate::output::{format_angles, OutputContext, WaypointRow};

/// Append a way-point to the pending recording of `interface`
///
/// Explicit angles are recorded as given; without them the arm is read back
/// and every settled joint is captured.
pub async fn record(
    service: &ControlService,
    store: &SequenceStore,
    interface: &str,
    name: &str,
    angles: &[(u8, f32)],
    ctx: &OutputContext,
) -> Result<()> {
    let manipulator = service.registry().get(interface)?;

    let waypoint = if angles.is_empty() {
        ctx.info(&format!("Reading current pose of {}...", interface));
        let (waypoint, _) = service.capture_waypoint(interface, name).await?;
        let unsettled = manipulator.len().saturating_sub(waypoint.values.len());
        if unsettled > 0 {
            ctx.warn(&format!(
                "{} joint(s) did not settle and are not recorded",
                unsettled
            ));
        }
        waypoint
    } else {
        let mut waypoint = JointAngleSet::new(name);
        for (motor, angle) in angles {
            let motor = manipulator.validate(MotorAddress(*motor))?;
            waypoint.set(motor, *angle);
        }
        waypoint
    };

    let buffer = store.load_recording()?;
    buffer.record(interface, waypoint.clone());
    store.save_recording(&buffer)?;

    let count = buffer.records(interface).len();
    ctx.outcome(
        &CommandOutcome::ok(format!(
            "Recorded way-point '{}' on {} ({} pending)",
            name, interface, count
        ))
        .with_data(waypoint),
    )
}

/// Show or clear the pending recording of `interface`
pub fn records(
    store: &SequenceStore,
    interface: &str,
    clear: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let buffer = store.load_recording()?;

    if clear {
        buffer.clear(interface);
        store.save_recording(&buffer)?;
        return ctx.outcome(&CommandOutcome::ok(format!(
            "Cleared pending way-points on {}",
            interface
        )));
    }

    let rows: Vec<WaypointRow> = buffer
        .records(interface)
        .into_iter()
        .enumerate()
        .map(|(i, waypoint)| WaypointRow {
            position: i + 1,
            angles: format_angles(&waypoint.values),
            name: waypoint.name,
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// Save the pending recording of `interface` as sequence `name`
pub fn finish(
    service: &ControlService,
    store: &SequenceStore,
    interface: &str,
    name: &str,
    model: Option<ArmModel>,
    ctx: &OutputContext,
) -> Result<()> {
    let manipulator = service.registry().get(interface)?;
    let buffer = store.load_recording()?;

    let sequence = buffer.finish(&manipulator, name, model)?;
    let path = store.save(&sequence)?;
    store.save_recording(&buffer)?;

    ctx.outcome(&CommandOutcome::ok(format!(
        "Saved sequence '{}' ({} way-points, {}) to {}",
        sequence.name,
        sequence.len(),
        sequence.side,
        path.display()
    )))
}
