//! canarm-seq - Joint sequence tooling
//!
//! - [`transform`]: pure merge/mirror derivation of paired sequences
//! - [`recording`]: per-interface way-point buffer turned into sequences
//! - [`store`]: JSON persistence of recorded and merged sequences
//!
//! Nothing here touches the bus.

pub mod error;
pub mod recording;
pub mod store;
pub mod transform;

pub use error::{SequenceError, SequenceResult};
pub use recording::RecordingBuffer;
pub use store::{MergedFileInfo, SequenceStore};
pub use transform::{
    descend, file_safe_name, initial_waypoint, merge, substitute_direction, MergeDirection,
    MergeOutcome, MergedPair, INITIAL_WAYPOINT,
};
