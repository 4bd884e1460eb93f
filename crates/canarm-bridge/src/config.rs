//! Transport configuration

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::BusTransport;
use crate::error::Result;
use crate::http::HttpBridge;
use crate::mock::MockBus;

// =============================================================================
// Transport Configuration
// =============================================================================

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// External HTTP CAN bridge
    Http(BridgeConfig),
    /// In-memory bus for testing and dry runs
    Mock(MockBusConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Http(BridgeConfig::default())
    }
}

/// HTTP bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bridge base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5260".to_string()
}

fn default_timeout_ms() -> u64 {
    50_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// In-memory bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockBusConfig {
    /// Simulated latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Answer read requests from the registers written so far
    #[serde(default = "default_simulate_motors")]
    pub simulate_motors: bool,
}

impl Default for MockBusConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            simulate_motors: default_simulate_motors(),
        }
    }
}

fn default_simulate_motors() -> bool {
    true
}

/// Create a bus transport based on configuration
pub fn create_transport(config: &TransportConfig) -> Result<Arc<dyn BusTransport>> {
    match config {
        TransportConfig::Http(cfg) => {
            let bridge = HttpBridge::from_config(cfg)?;
            tracing::info!(base_url = %bridge.base_url(), "Using HTTP CAN bridge");
            Ok(Arc::new(bridge))
        }
        TransportConfig::Mock(cfg) => {
            tracing::info!("Using in-memory mock bus");
            Ok(Arc::new(MockBus::new(cfg)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_config_parsing() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"type": "http", "base_url": "http://10.0.0.2:5260"}"#)
                .unwrap();
        match config {
            TransportConfig::Http(cfg) => {
                assert_eq!(cfg.base_url, "http://10.0.0.2:5260");
                assert_eq!(cfg.timeout_ms, 50_000);
            }
            other => panic!("unexpected config: {:?}", other),
        }

        let config: TransportConfig = serde_json::from_str(r#"{"type": "mock"}"#).unwrap();
        assert!(matches!(
            config,
            TransportConfig::Mock(MockBusConfig {
                simulate_motors: true,
                ..
            })
        ));
    }

    #[test]
    fn test_create_transport() {
        assert!(create_transport(&TransportConfig::default()).is_ok());
        assert!(create_transport(&TransportConfig::Mock(MockBusConfig::default())).is_ok());
    }
}
