//! Face landmark detection seam and the replay backend

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use camera_capture::VideoFrame;
use serde::Deserialize;
use tracing::{debug, info};

use crate::landmarks::LandmarkFrame;
use crate::DmsError;

/// Produces zero or more faces per frame, each in face-mesh index order
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkFrame>, DmsError>;
}

impl<D: LandmarkDetector + ?Sized> LandmarkDetector for Box<D> {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkFrame>, DmsError> {
        (**self).detect(frame)
    }
}

/// One line of a landmark recording
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    #[serde(default)]
    faces: Vec<LandmarkFrame>,
}

/// Replays face-mesh output recorded as JSON lines, one line per frame:
///
/// ```text
/// {"faces": [[{"x": 0.51, "y": 0.42, "z": -0.03}, ...]]}
/// {"faces": []}
/// ```
pub struct ReplayDetector {
    records: VecDeque<Vec<LandmarkFrame>>,
}

impl ReplayDetector {
    pub fn open(path: &Path) -> Result<Self, DmsError> {
        let file = File::open(path)
            .map_err(|e| DmsError::Replay(format!("{}: {}", path.display(), e)))?;
        let detector = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} landmark frames from {}",
            detector.len(),
            path.display()
        );
        Ok(detector)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DmsError> {
        let mut records = VecDeque::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DmsError::Replay(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ReplayRecord =
                serde_json::from_str(&line).map_err(|e| DmsError::ReplayRecord {
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            records.push_back(record.faces);
        }

        Ok(Self { records })
    }

    /// Frames left to replay
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LandmarkDetector for ReplayDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkFrame>, DmsError> {
        let faces = self.records.pop_front().ok_or(DmsError::ReplayExhausted)?;
        debug!("Frame {}: {} face(s) replayed", frame.sequence, faces.len());
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::face;

    fn recording(frames: &[Vec<LandmarkFrame>]) -> String {
        frames
            .iter()
            .map(|faces| serde_json::json!({ "faces": faces }).to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_replays_in_order() {
        let a = face(0.5, 0.5, 0.4, 0.25);
        let b = face(0.3, 0.5, 0.2, 0.05);
        let text = recording(&[vec![a.clone()], vec![], vec![a.clone(), b.clone()]]);

        let mut detector = ReplayDetector::from_reader(text.as_bytes()).unwrap();
        assert_eq!(detector.len(), 3);

        let frame = VideoFrame::blank(4, 4, 0, 0);
        assert_eq!(detector.detect(&frame).unwrap(), vec![a.clone()]);
        assert!(detector.detect(&frame).unwrap().is_empty());
        assert_eq!(detector.detect(&frame).unwrap(), vec![a, b]);
        assert!(matches!(
            detector.detect(&frame),
            Err(DmsError::ReplayExhausted)
        ));
    }

    #[test]
    fn test_blank_lines_and_missing_faces() {
        let text = "\n{}\n\n{\"faces\": []}\n";
        let detector = ReplayDetector::from_reader(text.as_bytes()).unwrap();
        assert_eq!(detector.len(), 2);
    }

    #[test]
    fn test_short_face_is_rejected_with_line_number() {
        let text = "{\"faces\": []}\n{\"faces\": [[{\"x\": 0.5, \"y\": 0.5}]]}";
        match ReplayDetector::from_reader(text.as_bytes()) {
            Err(DmsError::ReplayRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected record error, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("dms-replay-missing-0451.jsonl");
        assert!(matches!(
            ReplayDetector::open(&path),
            Err(DmsError::Replay(_))
        ));
    }
}
