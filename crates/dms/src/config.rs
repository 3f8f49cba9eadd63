//! DMS configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Average eye aspect ratio below which the eyes count as closed
    pub ear_threshold: f32,

    /// Eyes closed this long raises the eye-closure alert (milliseconds)
    pub eye_closed_threshold_ms: u64,

    /// Looking away this long raises the look-away alert (milliseconds)
    pub look_away_threshold_ms: u64,

    /// Grace period after a condition clears before the buzzer stops (milliseconds)
    pub recovery_delay_ms: u64,

    /// Half-width of the forward band around the frame centre (pixels)
    pub direction_dead_zone_px: f32,

    /// Eye contours narrower than this are treated as degenerate (pixels)
    pub min_eye_width_px: f32,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            eye_closed_threshold_ms: 5000,
            look_away_threshold_ms: 10_000,
            recovery_delay_ms: 2000,
            direction_dead_zone_px: 50.0,
            min_eye_width_px: 1.0,
        }
    }
}

impl DmsConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            eye_closed_threshold_ms: 2000,
            look_away_threshold_ms: 5000,
            direction_dead_zone_px: 35.0,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            eye_closed_threshold_ms: 8000,
            look_away_threshold_ms: 15_000,
            direction_dead_zone_px: 80.0,
            ..Default::default()
        }
    }

    /// Reject values that would make the state machine meaningless
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(self.ear_threshold > 0.0 && self.ear_threshold.is_finite()) {
            return Err(DmsError::Config(format!(
                "ear_threshold must be positive, got {}",
                self.ear_threshold
            )));
        }
        if self.eye_closed_threshold_ms == 0 || self.look_away_threshold_ms == 0 {
            return Err(DmsError::Config(
                "alert thresholds must be non-zero".to_string(),
            ));
        }
        if !(self.direction_dead_zone_px >= 0.0) {
            return Err(DmsError::Config(format!(
                "direction_dead_zone_px must be >= 0, got {}",
                self.direction_dead_zone_px
            )));
        }
        if !(self.min_eye_width_px > 0.0) {
            return Err(DmsError::Config(format!(
                "min_eye_width_px must be positive, got {}",
                self.min_eye_width_px
            )));
        }
        Ok(())
    }

    pub fn eye_closed_threshold(&self) -> Duration {
        Duration::from_millis(self.eye_closed_threshold_ms)
    }

    pub fn look_away_threshold(&self) -> Duration {
        Duration::from_millis(self.look_away_threshold_ms)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }
}
