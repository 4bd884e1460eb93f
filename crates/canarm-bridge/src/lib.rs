//! canarm-bridge - Access to the CAN bus through the HTTP bridge
//!
//! The arm never talks to a CAN adapter directly. Frames are posted to an
//! external bridge service and replies are fetched by polling its per-interface
//! inbox. This crate provides:
//!
//! - [`BusTransport`], the send/poll abstraction used by the controllers
//! - [`HttpBridge`], the `reqwest` client for the real bridge
//! - [`MockBus`], an in-memory bus with a send log and scripted inbox
//! - [`testing::TestBridge`], an `axum` fake bridge for integration tests
//!
//! # Example
//!
//! ```ignore
//! use canarm_bridge::{create_transport, TransportConfig};
//! use canarm_codec::{build_write_frame, MotorCommand};
//!
//! let transport = create_transport(&TransportConfig::default())?;
//! transport.send(&build_write_frame("can0", 61, &MotorCommand::Enable)).await?;
//! ```

mod adapter;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod testing;
pub mod wire;

pub use adapter::BusTransport;
pub use config::{create_transport, BridgeConfig, MockBusConfig, TransportConfig};
pub use error::{BridgeError, Result};
pub use http::HttpBridge;
pub use mock::MockBus;
