//! Read command - joint angle and gain read-back

use anyhow::Result;
use canarm_control::ControlService;
use canarm_core::CommandOutcome;

use crate::output::{AngleRow, GainRow, OutputContext, OutputFormat};

/// Query the arm on `interface` and print its angles and gains
pub async fn read(service: &ControlService, interface: &str, ctx: &OutputContext) -> Result<()> {
    let manipulator = service.registry().get(interface)?;
    ctx.info(&format!(
        "Reading {} joint(s) on {}...",
        manipulator.len(),
        interface
    ));

    let snapshot = service.feedback(interface)?.query().await?;

    let missing: Vec<String> = manipulator
        .motors()
        .iter()
        .filter(|m| !snapshot.angles.contains_key(m))
        .map(|m| m.to_string())
        .collect();
    if !missing.is_empty() {
        ctx.warn(&format!("No settled angle for motor(s): {}", missing.join(", ")));
    }

    if ctx.format == OutputFormat::Json {
        let data = serde_json::json!({
            "interface": interface,
            "angles": snapshot.angles,
            "gains": snapshot.named_gains(),
        });
        return ctx.outcome(&CommandOutcome::ok(format!("Read {}", interface)).with_data(data));
    }

    let angles: Vec<AngleRow> = snapshot
        .angles
        .iter()
        .map(|(motor, angle)| AngleRow {
            motor: motor.0,
            angle: format!("{:.4}", angle),
        })
        .collect();
    ctx.print(&angles);

    let gains: Vec<GainRow> = snapshot
        .gains
        .iter()
        .map(|(register, value)| GainRow {
            register: register.name().to_string(),
            index: format!("0x{:04X}", register.index()),
            value: format!("{:.4}", value),
        })
        .collect();
    ctx.print(&gains);

    Ok(())
}
