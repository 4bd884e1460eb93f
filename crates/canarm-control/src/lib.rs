//! canarm-control - Manipulator and gripper control over a CAN bridge
//!
//! Everything that talks to the bus goes through a shared
//! [`BusTransport`](canarm_bridge::BusTransport):
//!
//! - [`CommandDispatcher`]: joint and whole-arm commands with per-joint fan-out
//! - [`FeedbackEngine`]: read-back of target angles and gains
//! - [`SequencePlayer`]: way-point playback as background tasks
//! - [`GripperController`]: finger poses and named hand profiles
//! - [`MergedRoutine`]: the scripted up/down routine for both arms
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use canarm_bridge::HttpBridge;
//! use canarm_control::CommandDispatcher;
//! use canarm_core::{Manipulator, Side};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bridge = Arc::new(HttpBridge::new("http://localhost:5260")?);
//! let arm = Arc::new(Manipulator::for_side("can0", Side::Left)?);
//! let dispatcher = CommandDispatcher::new(bridge, arm);
//!
//! dispatcher.enable_all().await?;
//! dispatcher.set_all_angles(&[0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0]).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod fanout;
pub mod feedback;
pub mod gripper;
pub mod playback;
pub mod routine;
pub mod service;

pub use config::{ControlConfig, FeedbackTiming, PlaybackConfig, RoutineConfig};
pub use dispatcher::CommandDispatcher;
pub use feedback::{FeedbackEngine, FeedbackSnapshot};
pub use gripper::{
    GripperController, HandAddress, HandConfig, HandFamily, HandProfile, HandProfiles,
};
pub use playback::{play_pair, PlaybackFailure, PlaybackHandle, PlaybackReport, SequencePlayer};
pub use routine::{ArmUnit, MergedRoutine, RoutineReport, RoutineStep};
pub use service::ControlService;
