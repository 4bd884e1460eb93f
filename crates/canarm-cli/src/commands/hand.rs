//! Hand commands - finger poses and named profiles

use anyhow::Result;
use canarm_codec::HandPose;
use canarm_control::{ControlService, HandFamily, HandProfile};
use canarm_core::{CommandOutcome, Side};

use crate::output::OutputContext;

/// Send six finger positions to the hand on `side`
pub async fn hand_fingers(
    service: &ControlService,
    side: Side,
    values: &[u8],
    ctx: &OutputContext,
) -> Result<()> {
    let pose = HandPose::from_slice(values)?;
    let result = service.hand(side)?.set_fingers(&pose).await.map(|()| pose);
    ctx.outcome(&CommandOutcome::from_result(
        &format!("Set {} hand fingers", side),
        result,
    ))
}

/// Apply a configured profile to the hand on `side`
pub async fn hand_profile(
    service: &ControlService,
    side: Side,
    family: HandFamily,
    profile: HandProfile,
    ctx: &OutputContext,
) -> Result<()> {
    let hand = service.hand(side)?;
    let result = hand
        .apply_profile(&service.config().hand_profiles, family, profile)
        .await;
    ctx.outcome(&CommandOutcome::from_result(
        &format!("Apply {} {} profile to {} hand", family, profile, side),
        result,
    ))
}
