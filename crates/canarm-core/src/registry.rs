//! Interface to manipulator registry

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::manipulator::{Manipulator, MotorAddress, Side};

/// Configuration of one arm, keyed by bus interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmConfig {
    /// Device name; "left"/"right" in it selects the motor range
    pub device_name: String,
    /// Explicit motor ids, overriding the range implied by the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motors: Option<Vec<u8>>,
}

/// Manipulators by bus interface
///
/// Built once at start-up and passed to every operation that needs to
/// resolve an interface.
#[derive(Debug, Clone, Default)]
pub struct ManipulatorRegistry {
    arms: BTreeMap<String, Arc<Manipulator>>,
}

impl ManipulatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the `arms` configuration section
    pub fn from_config(arms: &BTreeMap<String, ArmConfig>) -> ControlResult<Self> {
        let mut registry = Self::new();
        for (interface, config) in arms {
            let manipulator = match &config.motors {
                Some(ids) => {
                    let motors = ids.iter().copied().map(MotorAddress).collect();
                    Manipulator::new(interface.clone(), motors)?
                }
                None => Manipulator::from_device_name(interface.clone(), &config.device_name),
            };
            tracing::info!(
                interface = %interface,
                device_name = %config.device_name,
                side = %manipulator.side(),
                motors = ?manipulator.motors(),
                "Registered manipulator"
            );
            registry.insert(manipulator);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, manipulator: Manipulator) -> Arc<Manipulator> {
        let manipulator = Arc::new(manipulator);
        self.arms
            .insert(manipulator.interface().to_string(), manipulator.clone());
        manipulator
    }

    /// Manipulator on `interface`
    pub fn get(&self, interface: &str) -> ControlResult<Arc<Manipulator>> {
        self.arms.get(interface).cloned().ok_or_else(|| {
            ControlError::NotFound(format!("no manipulator on interface {}", interface))
        })
    }

    /// Manipulator for `side`, if one is configured
    pub fn by_side(&self, side: Side) -> Option<Arc<Manipulator>> {
        self.arms.values().find(|m| m.side() == side).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Manipulator>> {
        self.arms.values()
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arms() -> BTreeMap<String, ArmConfig> {
        let mut arms = BTreeMap::new();
        arms.insert(
            "can0".to_string(),
            ArmConfig {
                device_name: "left_black_arm".to_string(),
                motors: None,
            },
        );
        arms.insert(
            "can1".to_string(),
            ArmConfig {
                device_name: "right_black_arm".to_string(),
                motors: None,
            },
        );
        arms
    }

    #[test]
    fn test_registry_from_config() {
        let registry = ManipulatorRegistry::from_config(&arms()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("can0").unwrap().side(), Side::Left);
        assert_eq!(registry.by_side(Side::Right).unwrap().interface(), "can1");
    }

    #[test]
    fn test_unknown_interface() {
        let registry = ManipulatorRegistry::from_config(&arms()).unwrap();
        assert!(matches!(
            registry.get("can9"),
            Err(ControlError::NotFound(_))
        ));
    }

    #[test]
    fn test_explicit_motor_list() {
        let mut config = arms();
        config.insert(
            "can2".to_string(),
            ArmConfig {
                device_name: "test_rig".to_string(),
                motors: Some(vec![51, 52, 53]),
            },
        );
        let registry = ManipulatorRegistry::from_config(&config).unwrap();
        assert_eq!(registry.get("can2").unwrap().len(), 3);

        config.insert(
            "can3".to_string(),
            ArmConfig {
                device_name: "broken".to_string(),
                motors: Some(vec![51, 51]),
            },
        );
        assert!(ManipulatorRegistry::from_config(&config).is_err());
    }
}
