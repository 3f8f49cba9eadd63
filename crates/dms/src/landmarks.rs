//! Face-mesh landmarks and the fixed index topology used by the classifier

use serde::{Deserialize, Serialize};

use crate::geometry::{EyeContour, Point2};
use crate::DmsError;

/// Minimum landmark count of the face-mesh topology (478 with iris refinement)
pub const FACE_MESH_LANDMARKS: usize = 468;

/// Left eye contour, ordered corner / upper lid / corner / lower lid
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Right eye contour, same ordering as [`LEFT_EYE`]
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Nose tip
pub const NOSE_TIP: usize = 1;

/// Normalized landmark coordinate; `z` is carried but unused
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Scale to pixel coordinates
    pub fn to_pixel(self, width: u32, height: u32) -> Point2 {
        Point2::new(self.x * width as f32, self.y * height as f32)
    }
}

/// All landmarks of one detected face, in detector index order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<Landmark>,
}

impl LandmarkFrame {
    /// Validate a detector output; every index used downstream must exist
    pub fn new(points: Vec<Landmark>) -> Result<Self, DmsError> {
        if points.len() < FACE_MESH_LANDMARKS {
            return Err(DmsError::KeypointsMissing {
                expected: FACE_MESH_LANDMARKS,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark `index` in pixel space
    pub fn pixel(&self, index: usize, width: u32, height: u32) -> Point2 {
        self.points[index].to_pixel(width, height)
    }

    /// Eye contour for one of [`LEFT_EYE`] / [`RIGHT_EYE`] in pixel space
    pub fn eye_contour(&self, indices: &[usize; 6], width: u32, height: u32) -> EyeContour {
        indices.map(|i| self.pixel(i, width, height))
    }

    /// Axis-aligned bounding-box area in pixel space
    pub fn pixel_bbox_area(&self, width: u32, height: u32) -> f32 {
        let mut min = Point2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for p in self.points.iter().map(|l| l.to_pixel(width, height)) {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        (max.x - min.x) * (max.y - min.y)
    }
}

impl<'de> Deserialize<'de> for LandmarkFrame {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<Landmark>::deserialize(deserializer)?;
        LandmarkFrame::new(points).map_err(serde::de::Error::custom)
    }
}

/// Synthetic faces for tests, also exported with the `test-support` feature
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures {
    use super::*;

    /// Face centred at normalized (`cx`, `cy`) spanning `size` in both axes.
    ///
    /// Eye contours use lids at `openness` times the eye width, so the EAR
    /// in a square frame is `2 * openness`.
    pub fn face(cx: f32, cy: f32, size: f32, openness: f32) -> LandmarkFrame {
        let half = size / 2.0;
        let mut points: Vec<Landmark> = (0..FACE_MESH_LANDMARKS)
            .map(|i| {
                let t = i as f32 / FACE_MESH_LANDMARKS as f32 * std::f32::consts::TAU;
                Landmark::new(cx + half * t.cos(), cy + half * t.sin())
            })
            .collect();

        let eye_width = size * 0.2;
        let lid = eye_width * openness;
        for (indices, x0) in [(LEFT_EYE, cx - size * 0.3), (RIGHT_EYE, cx + size * 0.1)] {
            let y = cy - size * 0.1;
            let contour = [
                (x0, y),
                (x0 + eye_width / 3.0, y - lid),
                (x0 + 2.0 * eye_width / 3.0, y - lid),
                (x0 + eye_width, y),
                (x0 + 2.0 * eye_width / 3.0, y + lid),
                (x0 + eye_width / 3.0, y + lid),
            ];
            for (&i, (x, y)) in indices.iter().zip(contour) {
                points[i] = Landmark::new(x, y);
            }
        }
        points[NOSE_TIP] = Landmark::new(cx, cy);

        LandmarkFrame { points }
    }
}
