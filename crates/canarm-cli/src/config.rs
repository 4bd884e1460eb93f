//! Configuration file handling for canarm
//!
//! The file is TOML unless its extension is `.yaml`/`.yml`. Every section is
//! optional.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use canarm_bridge::{BridgeConfig, MockBusConfig, TransportConfig};
use canarm_control::{ControlConfig, HandConfig};
use canarm_core::{ArmConfig, Side};
use serde::{Deserialize, Serialize};

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Bridge transport; `can_bridge_url` is a shorthand for an HTTP bridge
    pub transport: Option<TransportConfig>,
    pub can_bridge_url: Option<String>,
    /// Arms keyed by bus interface
    #[serde(default)]
    pub arms: BTreeMap<String, ArmConfig>,
    /// Hands keyed by side
    #[serde(default)]
    pub hands: BTreeMap<Side, HandConfig>,
    /// Timing, routine and hand profile settings
    #[serde(default)]
    pub control: ControlConfig,
    /// Root of the sequence store
    pub sequence_dir: Option<PathBuf>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(path, &content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Ok(serde_yaml::from_str(content)?)
        } else {
            Ok(toml::from_str(content)?)
        }
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("canarm");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        bridge: Option<&str>,
        mock: bool,
        sequence_dir: Option<&Path>,
        no_color: bool,
    ) -> MergedConfig {
        let transport = if mock {
            TransportConfig::Mock(MockBusConfig::default())
        } else if let Some(url) = bridge.map(String::from).or_else(|| self.can_bridge_url.clone()) {
            let mut bridge = match &self.transport {
                Some(TransportConfig::Http(config)) => config.clone(),
                _ => BridgeConfig::default(),
            };
            bridge.base_url = url;
            TransportConfig::Http(bridge)
        } else {
            self.transport.clone().unwrap_or_default()
        };

        let arms = if self.arms.is_empty() {
            default_arms()
        } else {
            self.arms.clone()
        };

        MergedConfig {
            transport,
            arms,
            hands: self.hands.clone(),
            control: self.control.clone(),
            sequence_dir: sequence_dir
                .map(Path::to_path_buf)
                .or_else(|| self.sequence_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            no_color: no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Left arm on can0, right arm on can1
fn default_arms() -> BTreeMap<String, ArmConfig> {
    BTreeMap::from([
        (
            "can0".to_string(),
            ArmConfig {
                device_name: "left_arm".to_string(),
                motors: None,
            },
        ),
        (
            "can1".to_string(),
            ArmConfig {
                device_name: "right_arm".to_string(),
                motors: None,
            },
        ),
    ])
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub transport: TransportConfig,
    pub arms: BTreeMap<String, ArmConfig>,
    pub hands: BTreeMap<Side, HandConfig>,
    pub control: ControlConfig,
    pub sequence_dir: PathBuf,
    pub no_color: bool,
}
