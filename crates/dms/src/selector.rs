//! Main-face selection

use crate::landmarks::LandmarkFrame;

/// Pick the face with the largest pixel-space bounding box.
///
/// The closest face to the camera is assumed to be the driver. Ties keep the
/// first face in detector order.
pub fn select_main_face(faces: &[LandmarkFrame], width: u32, height: u32) -> Option<&LandmarkFrame> {
    let mut faces = faces.iter();
    let first = faces.next()?;

    let mut best = first;
    let mut best_area = first.pixel_bbox_area(width, height);
    for face in faces {
        let area = face.pixel_bbox_area(width, height);
        if area > best_area {
            best = face;
            best_area = area;
        }
    }

    Some(best)
}
