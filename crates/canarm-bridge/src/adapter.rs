//! Bus transport trait

use async_trait::async_trait;
use canarm_codec::CanFrame;

use crate::error::Result;

/// Transport-agnostic access to the CAN bus
///
/// Writes are fire-and-forget: a successful `send` only means the bridge
/// accepted the frame. Replies are never pushed; callers pick them up with
/// `poll`, which drains what the bridge buffered for one identifier.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Hand one frame to the bus
    async fn send(&self, frame: &CanFrame) -> Result<()>;

    /// Fetch frames observed on `interface` with identifier `id`
    ///
    /// Returns the payload of each frame, byte 0 first. An empty vector means
    /// nothing new was seen.
    async fn poll(&self, interface: &str, id: u32) -> Result<Vec<Vec<u8>>>;
}
