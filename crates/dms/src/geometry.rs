//! Eye geometry

use serde::{Deserialize, Serialize};

/// 2D point in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    pub fn distance(self, other: Point2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Six ordered eye-contour points.
///
/// Positions 0 and 3 are the eye corners; 1<->5 and 2<->4 are the
/// upper/lower lid pairs.
pub type EyeContour = [Point2; 6];

/// Eye aspect ratio: `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`.
///
/// Tends to zero as the eye closes. The corner distance must be non-zero;
/// use [`checked_eye_aspect_ratio`] for untrusted landmarks.
pub fn eye_aspect_ratio(eye: &EyeContour) -> f32 {
    let a = eye[1].distance(eye[5]);
    let b = eye[2].distance(eye[4]);
    let c = eye[0].distance(eye[3]);
    (a + b) / (2.0 * c)
}

/// Eye aspect ratio, or `None` when the eye is narrower than `min_width`
pub fn checked_eye_aspect_ratio(eye: &EyeContour, min_width: f32) -> Option<f32> {
    let width = eye[0].distance(eye[3]);
    if !width.is_finite() || width < min_width {
        return None;
    }
    let ear = eye_aspect_ratio(eye);
    ear.is_finite().then_some(ear)
}
