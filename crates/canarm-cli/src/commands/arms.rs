//! Arms command - list configured manipulators

use canarm_control::ControlService;

use crate::output::{ArmRow, OutputContext};

/// List the manipulators known to the service
pub fn arms(service: &ControlService, ctx: &OutputContext) {
    let rows: Vec<ArmRow> = service
        .registry()
        .iter()
        .map(|arm| ArmRow {
            interface: arm.interface().to_string(),
            side: arm.side().to_string(),
            motors: arm
                .motors()
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();

    ctx.print(&rows);
}
