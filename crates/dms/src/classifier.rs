//! Per-frame eye closure and head direction classification

use serde::{Deserialize, Serialize};

use crate::config::DmsConfig;
use crate::geometry::checked_eye_aspect_ratio;
use crate::landmarks::{LandmarkFrame, LEFT_EYE, NOSE_TIP, RIGHT_EYE};

/// Coarse head direction from the nose-tip position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Left,
    Right,
    NoFace,
}

impl Direction {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Left => "Looking Left",
            Direction::Right => "Looking Right",
            Direction::NoFace => "No Face Detected",
        }
    }

    /// Anything but forward counts as looking away
    pub fn is_away(&self) -> bool {
        !matches!(self, Direction::Forward)
    }
}

/// Instantaneous classification of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Average EAR of both eyes; `None` without a face or with degenerate eyes
    pub eye_aspect_ratio: Option<f32>,
    pub eyes_closed: bool,
    pub direction: Direction,
}

impl Classification {
    /// Frame without a usable face
    pub fn no_face() -> Self {
        Self {
            eye_aspect_ratio: None,
            eyes_closed: false,
            direction: Direction::NoFace,
        }
    }

    pub fn face_detected(&self) -> bool {
        self.direction != Direction::NoFace
    }
}

/// Stateless classifier; all temporal reasoning lives in the state machine
#[derive(Debug, Clone)]
pub struct GazeClassifier {
    ear_threshold: f32,
    dead_zone_px: f32,
    min_eye_width_px: f32,
}

impl GazeClassifier {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            ear_threshold: config.ear_threshold,
            dead_zone_px: config.direction_dead_zone_px,
            min_eye_width_px: config.min_eye_width_px,
        }
    }

    pub fn classify(&self, face: Option<&LandmarkFrame>, width: u32, height: u32) -> Classification {
        let Some(face) = face else {
            return Classification::no_face();
        };

        let left = face.eye_contour(&LEFT_EYE, width, height);
        let right = face.eye_contour(&RIGHT_EYE, width, height);
        let ear = checked_eye_aspect_ratio(&left, self.min_eye_width_px)
            .zip(checked_eye_aspect_ratio(&right, self.min_eye_width_px))
            .map(|(l, r)| (l + r) / 2.0);

        Classification {
            eye_aspect_ratio: ear,
            eyes_closed: ear.is_some_and(|ear| ear < self.ear_threshold),
            direction: self.direction(face, width, height),
        }
    }

    fn direction(&self, face: &LandmarkFrame, width: u32, height: u32) -> Direction {
        let nose_x = face.pixel(NOSE_TIP, width, height).x;
        let center = width as f32 / 2.0;

        if nose_x < center - self.dead_zone_px {
            Direction::Left
        } else if nose_x > center + self.dead_zone_px {
            Direction::Right
        } else {
            Direction::Forward
        }
    }
}

impl Default for GazeClassifier {
    fn default() -> Self {
        Self::new(&DmsConfig::default())
    }
}
