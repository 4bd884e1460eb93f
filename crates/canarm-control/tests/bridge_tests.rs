//! Control over HTTP against the fake bridge

use std::sync::Arc;

use canarm_bridge::testing::TestBridge;
use canarm_bridge::BusTransport;
use canarm_codec::RegisterIndex;
use canarm_control::{CommandDispatcher, FeedbackEngine, FeedbackTiming, PlaybackConfig, SequencePlayer};
use canarm_core::{ArmModel, ControlError, JointAngleSet, JointSequence, Manipulator, MotorAddress, Side};
use pretty_assertions::assert_eq;

fn left_arm() -> Arc<Manipulator> {
    Arc::new(Manipulator::for_side("can0", Side::Left).unwrap())
}

fn fast_timing() -> FeedbackTiming {
    FeedbackTiming {
        request_gap_ms: 1,
        poll_interval_ms: 20,
        ..FeedbackTiming::default()
    }
}

#[tokio::test]
async fn test_written_angles_read_back_over_http() {
    let bridge = TestBridge::start().await.unwrap();
    let transport: Arc<dyn BusTransport> = Arc::new(bridge.client.clone());
    let dispatcher = CommandDispatcher::new(transport.clone(), left_arm());

    dispatcher.enable_all().await.unwrap();
    dispatcher
        .set_all_angles(&[0.0, 0.1, -0.2, 0.3, 0.0, 0.5, 1.25])
        .await
        .unwrap();
    dispatcher
        .set_gain(MotorAddress(61), RegisterIndex::PositionGain, 30.0)
        .await
        .unwrap();

    let snapshot = FeedbackEngine::new(transport, left_arm())
        .with_timing(fast_timing())
        .query()
        .await
        .unwrap();

    assert_eq!(snapshot.angles.len(), 7);
    assert_eq!(snapshot.angles[&MotorAddress(63)], -0.2);
    assert_eq!(snapshot.angles[&MotorAddress(67)], 1.25);
    assert_eq!(snapshot.gains[&RegisterIndex::PositionGain], 30.0);
}

#[tokio::test]
async fn test_playback_over_http() {
    let bridge = TestBridge::start().await.unwrap();
    let dispatcher = CommandDispatcher::new(Arc::new(bridge.client.clone()), left_arm());
    let player = SequencePlayer::new(dispatcher, PlaybackConfig { waypoint_delay_ms: 5 });

    let mut sequence = JointSequence::new("reach", Side::Left, Some(ArmModel::New));
    sequence.angles = vec![
        JointAngleSet::new("p1").with(61u8, 0.2),
        JointAngleSet::new("p2").with(61u8, 0.4).with(62u8, -0.1),
    ];

    let report = player.spawn(sequence).unwrap().wait().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.commands_sent, 3);
    assert_eq!(bridge.bus.register("can0", 61, 0x7016), Some(0.4));
    assert_eq!(bridge.bus.register("can0", 62, 0x7016), Some(-0.1));
}

#[tokio::test]
async fn test_rejected_frame_surfaces_transport_error() {
    let bridge = TestBridge::start().await.unwrap();
    bridge.bus.set_connected(false);
    let dispatcher = CommandDispatcher::new(Arc::new(bridge.client.clone()), left_arm());

    assert!(matches!(
        dispatcher.disable_all().await,
        Err(ControlError::Transport(_))
    ));
}
