//! canarm-core - Core types for manipulator control
//!
//! This crate holds the data model shared by the dispatcher, the feedback
//! engine and the sequence tools: motor addresses, manipulators and their
//! registry, recorded joint sequences, the control error taxonomy and the
//! structured outcome every operation can be rendered as.

pub mod error;
pub mod manipulator;
pub mod models;
pub mod outcome;
pub mod registry;

pub use error::{ControlError, ControlResult};
pub use manipulator::{Manipulator, MotorAddress, Side};
pub use models::*;
pub use outcome::CommandOutcome;
pub use registry::{ArmConfig, ManipulatorRegistry};
