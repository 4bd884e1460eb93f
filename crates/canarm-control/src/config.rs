//! Control timing configuration
//!
//! Every pause and time budget used by the feedback engine, sequence
//! playback and the merged routine. Values are in milliseconds in
//! configuration files and exposed as [`Duration`]s.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gripper::HandProfiles;

/// Complete control configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub feedback: FeedbackTiming,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub routine: RoutineConfig,
    #[serde(default)]
    pub hand_profiles: HandProfiles,
}

// =============================================================================
// Feedback
// =============================================================================

/// Timing of a feedback read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTiming {
    /// Gap between consecutive read-request frames
    #[serde(default = "default_request_gap")]
    pub request_gap_ms: u64,
    /// Pause after a poll that returned (even if empty)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Pause after a failed poll
    #[serde(default = "default_poll_retry")]
    pub poll_retry_ms: u64,
    /// Budget for one motor's target angle to settle
    #[serde(default = "default_angle_budget")]
    pub angle_budget_ms: u64,
    /// Budget for collecting the gain registers
    #[serde(default = "default_gain_budget")]
    pub gain_budget_ms: u64,
}

fn default_request_gap() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    80
}

fn default_poll_retry() -> u64 {
    60
}

fn default_angle_budget() -> u64 {
    2000
}

fn default_gain_budget() -> u64 {
    500
}

impl Default for FeedbackTiming {
    fn default() -> Self {
        Self {
            request_gap_ms: default_request_gap(),
            poll_interval_ms: default_poll_interval(),
            poll_retry_ms: default_poll_retry(),
            angle_budget_ms: default_angle_budget(),
            gain_budget_ms: default_gain_budget(),
        }
    }
}

impl FeedbackTiming {
    pub fn request_gap(&self) -> Duration {
        Duration::from_millis(self.request_gap_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_retry(&self) -> Duration {
        Duration::from_millis(self.poll_retry_ms)
    }

    pub fn angle_budget(&self) -> Duration {
        Duration::from_millis(self.angle_budget_ms)
    }

    pub fn gain_budget(&self) -> Duration {
        Duration::from_millis(self.gain_budget_ms)
    }
}

// =============================================================================
// Playback
// =============================================================================

/// Sequence playback pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Pause after each way-point
    #[serde(default = "default_waypoint_delay")]
    pub waypoint_delay_ms: u64,
}

fn default_waypoint_delay() -> u64 {
    1000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            waypoint_delay_ms: default_waypoint_delay(),
        }
    }
}

impl PlaybackConfig {
    pub fn waypoint_delay(&self) -> Duration {
        Duration::from_millis(self.waypoint_delay_ms)
    }
}

// =============================================================================
// Merged routine
// =============================================================================

/// Pauses and speed used by the merged up/down routine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutineConfig {
    /// Wait after moving the hands to the anti-collision pose
    #[serde(default = "default_hand_settle")]
    pub hand_settle_ms: u64,
    /// Wait after clearing faults
    #[serde(default = "default_short_settle")]
    pub clear_settle_ms: u64,
    /// Wait after enabling the arms
    #[serde(default = "default_enable_settle")]
    pub enable_settle_ms: u64,
    /// Wait after setting speeds
    #[serde(default = "default_short_settle")]
    pub speed_settle_ms: u64,
    /// Wait after disabling the arms
    #[serde(default = "default_short_settle")]
    pub disable_settle_ms: u64,
    /// Speed limit applied to every joint before playback
    #[serde(default = "default_routine_speed")]
    pub speed: f32,
    /// Way-point pause during routine playback
    #[serde(default = "default_routine_waypoint_delay")]
    pub waypoint_delay_ms: u64,
}

fn default_hand_settle() -> u64 {
    500
}

fn default_short_settle() -> u64 {
    200
}

fn default_enable_settle() -> u64 {
    500
}

fn default_routine_speed() -> f32 {
    0.8
}

fn default_routine_waypoint_delay() -> u64 {
    1
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            hand_settle_ms: default_hand_settle(),
            clear_settle_ms: default_short_settle(),
            enable_settle_ms: default_enable_settle(),
            speed_settle_ms: default_short_settle(),
            disable_settle_ms: default_short_settle(),
            speed: default_routine_speed(),
            waypoint_delay_ms: default_routine_waypoint_delay(),
        }
    }
}

impl RoutineConfig {
    /// Playback pacing used inside the routine
    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            waypoint_delay_ms: self.waypoint_delay_ms,
        }
    }
}
