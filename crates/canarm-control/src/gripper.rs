//! Gripper control
//!
//! Hands take a single standard frame carrying six finger positions. Named
//! profiles are configured per hand family and side; the thumb variants of
//! the `sn` left hand are derived from its press profile.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use canarm_bridge::BusTransport;
use canarm_codec::constants::{address, hand};
use canarm_codec::{build_hand_frame, HandPose};
use canarm_core::{ControlError, ControlResult, Side};
use serde::{Deserialize, Serialize};

// =============================================================================
// Hand addressing
// =============================================================================

/// Where one hand is attached, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandConfig {
    /// Bus interface the hand shares with its arm
    pub interface: String,
    /// Device id as hex (`"0x28"`); empty means the side's default
    #[serde(default)]
    pub id: String,
}

/// One hand on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandAddress {
    pub side: Side,
    pub device_id: u32,
}

impl HandAddress {
    /// Default device id for a side (left 0x28, right 0x27)
    pub fn default_id(side: Side) -> u32 {
        match side {
            Side::Left => address::LEFT_HAND,
            _ => address::RIGHT_HAND,
        }
    }

    /// Parse a configured id, falling back to the side default
    pub fn from_config(side: Side, id: &str) -> Self {
        let trimmed = id.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let device_id = match u32::from_str_radix(hex, 16) {
            Ok(id) => id,
            Err(_) => {
                if !trimmed.is_empty() {
                    tracing::warn!(side = %side, id, "Invalid hand id, using default");
                }
                Self::default_id(side)
            }
        };
        Self { side, device_id }
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Hand product family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandFamily {
    Sks,
    Sn,
}

impl HandFamily {
    /// Family named in a merged file name: `sks` if present, else `sn`
    pub fn from_file_name(name: &str) -> Self {
        if name.to_lowercase().contains("sks") {
            HandFamily::Sks
        } else {
            HandFamily::Sn
        }
    }
}

impl fmt::Display for HandFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandFamily::Sks => "sks",
            HandFamily::Sn => "sn",
        })
    }
}

impl FromStr for HandFamily {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sks" => Ok(HandFamily::Sks),
            "sn" => Ok(HandFamily::Sn),
            other => Err(ControlError::NotFound(format!("unknown hand type: {}", other))),
        }
    }
}

/// Named hand profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandProfile {
    Press,
    Release,
    HighThumb,
    HighProThumb,
}

impl fmt::Display for HandProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandProfile::Press => "press",
            HandProfile::Release => "release",
            HandProfile::HighThumb => "high_thumb",
            HandProfile::HighProThumb => "high_pro_thumb",
        })
    }
}

impl FromStr for HandProfile {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "press" => Ok(HandProfile::Press),
            "release" => Ok(HandProfile::Release),
            "high_thumb" => Ok(HandProfile::HighThumb),
            "high_pro_thumb" => Ok(HandProfile::HighProThumb),
            other => Err(ControlError::NotFound(format!("unknown profile: {}", other))),
        }
    }
}

/// Profiles of one hand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideProfiles {
    #[serde(default)]
    pub press: Vec<u8>,
    #[serde(default)]
    pub release: Vec<u8>,
    /// Thumb values overriding the first two press values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub high_thumb: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub high_pro_thumb: Vec<u8>,
}

/// Profiles of one hand family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyProfiles {
    #[serde(default)]
    pub left: SideProfiles,
    #[serde(default)]
    pub right: SideProfiles,
}

/// Pose that keeps the hands clear of the arms while they move
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntiCollision {
    #[serde(default)]
    pub left: Vec<u8>,
    #[serde(default)]
    pub right: Vec<u8>,
}

/// Every configured hand profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandProfiles {
    #[serde(default)]
    pub sks: FamilyProfiles,
    #[serde(default)]
    pub sn: FamilyProfiles,
    #[serde(default)]
    pub anti_collision: AntiCollision,
}

impl HandProfiles {
    fn side_profiles(&self, family: HandFamily, side: Side) -> ControlResult<&SideProfiles> {
        let family_profiles = match family {
            HandFamily::Sks => &self.sks,
            HandFamily::Sn => &self.sn,
        };
        match side {
            Side::Left => Ok(&family_profiles.left),
            Side::Right => Ok(&family_profiles.right),
            Side::Unknown => Err(ControlError::NotFound(
                "hand profiles need a left or right hand".into(),
            )),
        }
    }

    /// Finger values of a profile
    ///
    /// Thumb variants copy the press profile and replace its first two
    /// values. The result must hold exactly six values.
    pub fn resolve(
        &self,
        family: HandFamily,
        side: Side,
        profile: HandProfile,
    ) -> ControlResult<HandPose> {
        let profiles = self.side_profiles(family, side)?;
        let values = match profile {
            HandProfile::Press => profiles.press.clone(),
            HandProfile::Release => profiles.release.clone(),
            HandProfile::HighThumb | HandProfile::HighProThumb => {
                let thumb = if profile == HandProfile::HighThumb {
                    &profiles.high_thumb
                } else {
                    &profiles.high_pro_thumb
                };
                if thumb.is_empty() {
                    return Err(ControlError::NotFound(format!(
                        "{} profile not configured for {} {} hand",
                        profile, family, side
                    )));
                }
                let mut values = vec![0u8; hand::CHANNELS];
                for (slot, value) in values.iter_mut().zip(&profiles.press) {
                    *slot = *value;
                }
                for (slot, value) in values.iter_mut().zip(thumb.iter().take(2)) {
                    *slot = *value;
                }
                values
            }
        };

        if values.len() != hand::CHANNELS {
            return Err(ControlError::Encoding(format!(
                "{} {} {} profile has {} values, expected {}",
                family,
                side,
                profile,
                values.len(),
                hand::CHANNELS
            )));
        }
        Ok(HandPose::from_slice(&values)?)
    }

    /// Anti-collision pose of one hand
    pub fn anti_collision(&self, side: Side) -> ControlResult<HandPose> {
        let values = match side {
            Side::Left => &self.anti_collision.left,
            Side::Right => &self.anti_collision.right,
            Side::Unknown => {
                return Err(ControlError::NotFound("no anti-collision pose for unknown side".into()))
            }
        };
        if values.len() != hand::CHANNELS {
            return Err(ControlError::Encoding(format!(
                "{} anti-collision pose has {} values, expected {}",
                side,
                values.len(),
                hand::CHANNELS
            )));
        }
        Ok(HandPose::from_slice(values)?)
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Sends finger frames to one hand
#[derive(Clone)]
pub struct GripperController {
    transport: Arc<dyn BusTransport>,
    interface: String,
    hand: HandAddress,
}

impl fmt::Debug for GripperController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GripperController")
            .field("interface", &self.interface)
            .field("hand", &self.hand)
            .finish_non_exhaustive()
    }
}

impl GripperController {
    pub fn new(transport: Arc<dyn BusTransport>, interface: impl Into<String>, hand: HandAddress) -> Self {
        Self {
            transport,
            interface: interface.into(),
            hand,
        }
    }

    /// Controllers for every configured hand, keyed by side
    pub fn from_config(
        transport: Arc<dyn BusTransport>,
        hands: &BTreeMap<Side, HandConfig>,
    ) -> BTreeMap<Side, GripperController> {
        hands
            .iter()
            .filter(|(side, _)| **side != Side::Unknown)
            .map(|(side, config)| {
                (
                    *side,
                    GripperController::new(
                        transport.clone(),
                        config.interface.clone(),
                        HandAddress::from_config(*side, &config.id),
                    ),
                )
            })
            .collect()
    }

    pub fn side(&self) -> Side {
        self.hand.side
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn device_id(&self) -> u32 {
        self.hand.device_id
    }

    /// Move the fingers to `pose`
    pub async fn set_fingers(&self, pose: &HandPose) -> ControlResult<()> {
        let frame = build_hand_frame(&self.interface, self.hand.device_id, pose);
        tracing::debug!(
            iface = %self.interface,
            side = %self.hand.side,
            id = frame.id,
            fingers = ?pose.to_array(),
            "Sending hand frame"
        );
        self.transport.send(&frame).await?;
        Ok(())
    }

    /// Apply a named profile and return the pose that was sent
    pub async fn apply_profile(
        &self,
        profiles: &HandProfiles,
        family: HandFamily,
        profile: HandProfile,
    ) -> ControlResult<HandPose> {
        let pose = profiles.resolve(family, self.hand.side, profile)?;
        tracing::info!(side = %self.hand.side, family = %family, profile = %profile, "Applying hand profile");
        self.set_fingers(&pose).await?;
        Ok(pose)
    }

    /// Move to the anti-collision pose
    pub async fn anti_collision(&self, profiles: &HandProfiles) -> ControlResult<HandPose> {
        let pose = profiles.anti_collision(self.hand.side)?;
        self.set_fingers(&pose).await?;
        Ok(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canarm_bridge::MockBus;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn profiles() -> HandProfiles {
        HandProfiles {
            sks: FamilyProfiles {
                left: SideProfiles {
                    press: vec![10, 20, 30, 40, 50, 60],
                    release: vec![0; 6],
                    ..Default::default()
                },
                right: SideProfiles {
                    press: vec![1, 2, 3],
                    release: vec![0; 6],
                    ..Default::default()
                },
            },
            sn: FamilyProfiles {
                left: SideProfiles {
                    press: vec![100, 110, 120, 130, 140, 150],
                    release: vec![5; 6],
                    high_thumb: vec![200, 210],
                    high_pro_thumb: vec![250, 255],
                },
                right: SideProfiles::default(),
            },
            anti_collision: AntiCollision {
                left: vec![0, 90, 0, 0, 0, 0],
                right: vec![0, 90, 0, 0, 0],
            },
        }
    }

    #[rstest]
    #[case("0x28", Side::Left, 0x28)]
    #[case("0X27", Side::Right, 0x27)]
    #[case("", Side::Left, 40)]
    #[case("zz", Side::Right, 39)]
    fn test_hand_address(#[case] id: &str, #[case] side: Side, #[case] expected: u32) {
        assert_eq!(HandAddress::from_config(side, id).device_id, expected);
    }

    #[test]
    fn test_press_and_release() {
        let profiles = profiles();
        let pose = profiles
            .resolve(HandFamily::Sks, Side::Left, HandProfile::Press)
            .unwrap();
        assert_eq!(pose.to_array(), [10, 20, 30, 40, 50, 60]);
        let pose = profiles
            .resolve(HandFamily::Sn, Side::Left, HandProfile::Release)
            .unwrap();
        assert_eq!(pose.to_array(), [5; 6]);
    }

    #[test]
    fn test_thumb_variants_override_first_two() {
        let profiles = profiles();
        let high = profiles
            .resolve(HandFamily::Sn, Side::Left, HandProfile::HighThumb)
            .unwrap();
        assert_eq!(high.to_array(), [200, 210, 120, 130, 140, 150]);
        let pro = profiles
            .resolve(HandFamily::Sn, Side::Left, HandProfile::HighProThumb)
            .unwrap();
        assert_eq!(pro.to_array(), [250, 255, 120, 130, 140, 150]);
    }

    #[test]
    fn test_unsupported_and_malformed_profiles() {
        let profiles = profiles();
        assert!(matches!(
            profiles.resolve(HandFamily::Sks, Side::Left, HandProfile::HighThumb),
            Err(ControlError::NotFound(_))
        ));
        assert!(matches!(
            profiles.resolve(HandFamily::Sks, Side::Right, HandProfile::Press),
            Err(ControlError::Encoding(_))
        ));
        assert!(matches!(
            profiles.resolve(HandFamily::Sn, Side::Right, HandProfile::Press),
            Err(ControlError::Encoding(_))
        ));
        assert!(profiles.anti_collision(Side::Right).is_err());
    }

    #[test]
    fn test_anti_collision_needs_exactly_six_values() {
        let mut profiles = profiles();
        assert_eq!(
            profiles.anti_collision(Side::Left).unwrap().to_array(),
            [0, 90, 0, 0, 0, 0]
        );
        profiles.anti_collision.left = vec![0, 90, 0, 0, 0, 0, 7];
        assert!(matches!(
            profiles.anti_collision(Side::Left),
            Err(ControlError::Encoding(_))
        ));
        assert!(matches!(
            profiles.anti_collision(Side::Right),
            Err(ControlError::Encoding(_))
        ));
    }

    #[rstest]
    #[case("lift_sks_up.json", HandFamily::Sks)]
    #[case("SKS_down", HandFamily::Sks)]
    #[case("lift_up.json", HandFamily::Sn)]
    fn test_family_from_file_name(#[case] name: &str, #[case] expected: HandFamily) {
        assert_eq!(HandFamily::from_file_name(name), expected);
    }

    #[test]
    fn test_profile_names() {
        assert_eq!("high-thumb".parse::<HandProfile>().unwrap(), HandProfile::HighThumb);
        assert_eq!("SN".parse::<HandFamily>().unwrap(), HandFamily::Sn);
        assert!("grip".parse::<HandProfile>().is_err());
    }

    #[test]
    fn test_profiles_from_yaml() {
        let yaml = r#"
sn:
  left:
    press: [1, 2, 3, 4, 5, 6]
    high_thumb: [9, 9]
anti_collision:
  right: [0, 0, 0, 0, 0, 0]
"#;
        let profiles: HandProfiles = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            profiles
                .resolve(HandFamily::Sn, Side::Left, HandProfile::HighThumb)
                .unwrap()
                .to_array(),
            [9, 9, 3, 4, 5, 6]
        );
        assert!(profiles.anti_collision(Side::Right).is_ok());
    }

    #[tokio::test]
    async fn test_apply_profile_sends_standard_frame() {
        let bus = Arc::new(MockBus::scripted());
        let hand = GripperController::new(
            bus.clone(),
            "can0",
            HandAddress::from_config(Side::Left, "0x28"),
        );
        hand.apply_profile(&profiles(), HandFamily::Sks, HandProfile::Press)
            .await
            .unwrap();

        let sent = bus.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, 0x28);
        assert!(!sent[0].extended);
        assert_eq!(sent[0].data, vec![0x01, 10, 20, 30, 40, 50, 60]);
    }

    #[tokio::test]
    async fn test_failed_resolution_sends_nothing() {
        let bus = Arc::new(MockBus::scripted());
        let hand = GripperController::new(bus.clone(), "can1", HandAddress::from_config(Side::Right, ""));
        assert!(hand
            .apply_profile(&profiles(), HandFamily::Sn, HandProfile::HighThumb)
            .await
            .is_err());
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn test_from_config_skips_unknown_side() {
        let bus: Arc<dyn BusTransport> = Arc::new(MockBus::scripted());
        let hands = BTreeMap::from([
            (Side::Left, HandConfig { interface: "can0".into(), id: "0x28".into() }),
            (Side::Unknown, HandConfig { interface: "can9".into(), id: String::new() }),
        ]);
        let controllers = GripperController::from_config(bus, &hands);
        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[&Side::Left].device_id(), 0x28);
    }
}
