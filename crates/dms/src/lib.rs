//! Driver Monitoring System (DMS)
//!
//! Driver distraction detection from face-mesh landmarks:
//! - Main face selection (largest face in frame)
//! - Eye closure from the eye aspect ratio
//! - Head direction from the nose-tip position
//! - Debounced eye-closure and look-away alerts with a recovery grace period

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod geometry;
pub mod landmarks;
pub mod selector;
pub mod state;

pub use analysis::{DmsAlert, DmsAnalysis};
pub use classifier::{Classification, Direction, GazeClassifier};
pub use config::DmsConfig;
pub use detector::{LandmarkDetector, ReplayDetector};
pub use geometry::{eye_aspect_ratio, EyeContour, Point2};
pub use landmarks::{Landmark, LandmarkFrame};
pub use selector::select_main_face;
pub use state::{AxisPhase, AxisState, DistractionState, SinkCommand, Thresholds, TickOutcome};

use std::time::Instant;

use thiserror::Error;

use landmarks::{LEFT_EYE, RIGHT_EYE};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Face has {actual} landmarks, expected at least {expected}")]
    KeypointsMissing { expected: usize, actual: usize },

    #[error("Landmark replay failed: {0}")]
    Replay(String),

    #[error("Invalid landmark record on line {line}: {reason}")]
    ReplayRecord { line: usize, reason: String },

    #[error("Landmark replay exhausted")]
    ReplayExhausted,
}

/// Driver monitoring module: selector, classifier and state machine for one
/// monitored session
pub struct DistractionMonitor {
    classifier: GazeClassifier,
    thresholds: Thresholds,
    state: DistractionState,
}

impl DistractionMonitor {
    /// Create a new monitor with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            classifier: GazeClassifier::new(&config),
            thresholds: Thresholds::from(&config),
            state: DistractionState::default(),
        })
    }

    /// Analyze the faces detected in one frame
    pub fn analyze(
        &mut self,
        faces: &[LandmarkFrame],
        width: u32,
        height: u32,
        now: Instant,
    ) -> DmsAnalysis {
        let face = select_main_face(faces, width, height);
        let classification = self.classifier.classify(face, width, height);
        let tick = self.state.update(&classification, now, &self.thresholds);

        let eye_points = face
            .map(|face| {
                let left = face.eye_contour(&LEFT_EYE, width, height);
                let right = face.eye_contour(&RIGHT_EYE, width, height);
                left.into_iter().chain(right).collect()
            })
            .unwrap_or_default();

        let mut alerts = Vec::new();
        if tick.eyes_closed_alert {
            alerts.push(DmsAlert::EyesClosed);
        }
        if tick.looking_away_alert {
            alerts.push(DmsAlert::LookingAway(classification.direction));
        }

        DmsAnalysis {
            classification,
            eye_points,
            eyes_closed_for: tick.eyes_closed_for,
            looking_away_for: tick.looking_away_for,
            alerts,
            eye_alert_armed: self.state.eye_alert_armed(),
            look_away_alert_armed: self.state.look_away_alert_armed(),
            sink_command: tick.command,
        }
    }

    pub fn state(&self) -> &DistractionState {
        &self.state
    }

    /// Reset driver state (on driver change)
    pub fn reset_state(&mut self) {
        self.state.reset();
    }
}
