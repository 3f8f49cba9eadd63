//! DMS analysis results and alerts

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::{Classification, Direction};
use crate::geometry::Point2;
use crate::state::SinkCommand;

/// DMS alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmsAlert {
    /// Eyes closed past the closure threshold
    EyesClosed,

    /// Head turned away past the look-away threshold
    LookingAway(Direction),
}

impl DmsAlert {
    /// On-screen alert text
    pub fn message(&self) -> String {
        match self {
            DmsAlert::EyesClosed => "ALERT: Eyes Closed!".to_string(),
            DmsAlert::LookingAway(direction) => format!("ALERT: {}!", direction.label()),
        }
    }
}

/// Complete DMS analysis result for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Classification of the selected face
    pub classification: Classification,

    /// Eye contour points of the selected face, left then right (pixels)
    pub eye_points: Vec<Point2>,

    /// Continuous eye closure
    pub eyes_closed_for: Duration,

    /// Continuous look-away
    pub looking_away_for: Duration,

    /// Active alert conditions
    pub alerts: Vec<DmsAlert>,

    /// Alert flags after this frame
    pub eye_alert_armed: bool,
    pub look_away_alert_armed: bool,

    /// What the alert sink should do
    pub sink_command: SinkCommand,
}

impl DmsAnalysis {
    pub fn face_detected(&self) -> bool {
        self.classification.face_detected()
    }

    /// Check if any alerts are active
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Get highest severity alert
    pub fn highest_severity_alert(&self) -> Option<DmsAlert> {
        // Eye closure outranks looking away
        if self.alerts.contains(&DmsAlert::EyesClosed) {
            Some(DmsAlert::EyesClosed)
        } else {
            self.alerts.first().copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(alerts: Vec<DmsAlert>) -> DmsAnalysis {
        DmsAnalysis {
            classification: Classification::no_face(),
            eye_points: Vec::new(),
            eyes_closed_for: Duration::ZERO,
            looking_away_for: Duration::ZERO,
            alerts,
            eye_alert_armed: false,
            look_away_alert_armed: false,
            sink_command: SinkCommand::Hold,
        }
    }

    #[test]
    fn test_alert_messages() {
        assert_eq!(DmsAlert::EyesClosed.message(), "ALERT: Eyes Closed!");
        assert_eq!(
            DmsAlert::LookingAway(Direction::Right).message(),
            "ALERT: Looking Right!"
        );
    }

    #[test]
    fn test_highest_severity() {
        let a = analysis(vec![DmsAlert::LookingAway(Direction::Left), DmsAlert::EyesClosed]);
        assert!(a.has_alerts());
        assert_eq!(a.highest_severity_alert(), Some(DmsAlert::EyesClosed));

        assert_eq!(analysis(vec![]).highest_severity_alert(), None);
    }
}
