//! Sequence commands - list, merge and play recorded sequences

use anyhow::{bail, Result};
use canarm_control::{play_pair, ControlService, PlaybackHandle, PlaybackReport};
use canarm_core::{ArmModel, CommandOutcome, Side};
use canarm_seq::{merge, SequenceStore};

use crate::output::{
    format_angles, MergedRow, OutputContext, OutputFormat, PlaybackRow, SequenceRow, StepRow,
    WaypointRow,
};

/// List recorded sequences
pub fn list_sequences(store: &SequenceStore, ctx: &OutputContext) -> Result<()> {
    let rows: Vec<SequenceRow> = store
        .load_all()?
        .into_iter()
        .map(|s| SequenceRow {
            side: s.side.to_string(),
            model: s.arm_model.map(|m| m.to_string()).unwrap_or_default(),
            waypoints: s.len(),
            name: s.name,
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// Show the way-points of one sequence
pub fn show_sequence(store: &SequenceStore, name: &str, ctx: &OutputContext) -> Result<()> {
    let sequence = store.find(name)?;

    if ctx.format == OutputFormat::Json {
        ctx.print_json(&sequence);
        return Ok(());
    }

    ctx.print_kv(&[
        ("Name", sequence.name.clone()),
        ("Side", sequence.side.to_string()),
        (
            "Model",
            sequence
                .arm_model
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]);

    let rows: Vec<WaypointRow> = sequence
        .angles
        .iter()
        .enumerate()
        .map(|(i, waypoint)| WaypointRow {
            position: i + 1,
            name: waypoint.name.clone(),
            angles: format_angles(&waypoint.values),
        })
        .collect();
    ctx.print(&rows);
    Ok(())
}

/// Delete a recorded sequence
pub fn delete_sequence(store: &SequenceStore, name: &str, ctx: &OutputContext) -> Result<()> {
    store.delete(name)?;
    ctx.outcome(&CommandOutcome::ok(format!("Deleted sequence '{}'", name)))
}

/// Merge two recorded sequences into a left/right file
pub fn merge_sequences(
    store: &SequenceStore,
    first: &str,
    second: &str,
    name: &str,
    model: Option<ArmModel>,
    ctx: &OutputContext,
) -> Result<()> {
    let first = store.find(first)?;
    let second = store.find(second)?;

    let outcome = merge(&first, &second, name, model)?;
    let written = store.save_merge(&outcome)?;

    let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
    ctx.outcome(
        &CommandOutcome::ok(format!(
            "Merged '{}' ({}, {}): {}",
            name,
            outcome.direction,
            outcome.arm_model,
            files.join(", ")
        ))
        .with_data(&files),
    )
}

/// Play a recorded sequence on the arm at `interface`
pub async fn play_sequence(
    service: &ControlService,
    store: &SequenceStore,
    interface: &str,
    name: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let player = service.player(interface)?;
    let sequence = match player.dispatcher().manipulator().side() {
        Side::Unknown => store.find(name)?,
        side => store.find_for_side(name, side)?,
    };

    ctx.info(&format!(
        "Playing '{}' ({} way-points) on {}...",
        sequence.name,
        sequence.len(),
        interface
    ));
    let handle = player.spawn(sequence)?;
    let report = wait_or_interrupt(handle).await?;

    print_playback(&[report], ctx);
    Ok(())
}

/// List merged up/down files
pub fn list_merged(store: &SequenceStore, ctx: &OutputContext) -> Result<()> {
    let rows: Vec<MergedRow> = store
        .list_merged()?
        .into_iter()
        .map(|info| MergedRow {
            file: info.file_name,
            direction: info.direction.to_string(),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// Play both sides of a merged file at the same time
pub async fn play_merged(
    service: &ControlService,
    store: &SequenceStore,
    file: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let pair = store.load_merged(file)?;
    let left = service.player_for_side(Side::Left)?;
    let right = service.player_for_side(Side::Right)?;

    ctx.info(&format!("Playing '{}' on both arms...", file));
    let (left, right) = play_pair(&left, &right, &pair)?;

    let reports = tokio::select! {
        (left, right) = async { tokio::join!(left.wait(), right.wait()) } => [left?, right?],
        _ = tokio::signal::ctrl_c() => bail!("Playback of '{}' interrupted", file),
    };

    print_playback(&reports, ctx);
    Ok(())
}

/// Run the scripted up/down routine of a merged file
pub async fn run_merged(
    service: &ControlService,
    store: &SequenceStore,
    file: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let pair = store.load_merged(file)?;
    let routine = service.routine()?;

    ctx.info(&format!("Running routine '{}'...", file));
    let report = tokio::select! {
        report = routine.run(file, &pair) => report?,
        _ = tokio::signal::ctrl_c() => bail!("Routine '{}' interrupted", file),
    };

    if ctx.format == OutputFormat::Json {
        ctx.print_json(&report);
    } else {
        let steps: Vec<StepRow> = report
            .steps
            .iter()
            .map(|s| StepRow {
                step: s.step.to_string(),
                side: s.side.to_string(),
                result: s.error.clone().unwrap_or_else(|| "ok".to_string()),
            })
            .collect();
        ctx.print(&steps);
        print_playback(&report.playback, ctx);
    }

    if report.is_clean() {
        ctx.success(&format!("Routine '{}' ({}) completed", file, report.direction));
    } else {
        ctx.warn(&format!(
            "Routine '{}' completed with {} failed step(s)",
            file,
            report.failures().count()
        ));
    }
    Ok(())
}

async fn wait_or_interrupt(handle: PlaybackHandle) -> Result<PlaybackReport> {
    let id = handle.id();
    let sequence = handle.sequence().to_string();
    tokio::select! {
        report = handle.wait() => Ok(report?),
        _ = tokio::signal::ctrl_c() => bail!("Playback {} of '{}' interrupted", id, sequence),
    }
}

fn print_playback(reports: &[PlaybackReport], ctx: &OutputContext) {
    let rows: Vec<PlaybackRow> = reports
        .iter()
        .map(|r| PlaybackRow {
            interface: r.interface.clone(),
            sequence: r.sequence.clone(),
            waypoints: r.waypoints,
            sent: r.commands_sent,
            failed: r.failures.len(),
        })
        .collect();
    ctx.print(&rows);

    for report in reports {
        for failure in &report.failures {
            ctx.warn(&format!(
                "{}: way-point '{}' motor {}: {}",
                report.interface, failure.waypoint, failure.motor, failure.error
            ));
        }
    }
}
