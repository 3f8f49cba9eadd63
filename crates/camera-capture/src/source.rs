//! Frame source backends

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{CameraConfig, CameraError, FrameSource, VideoFrame};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Synthetic black frames at a fixed size and rate.
///
/// Used when landmarks come from a recording and no pixels are needed
/// beyond the frame geometry.
pub struct BlankSource {
    width: u32,
    height: u32,
    fps: u32,
    interval_ns: u64,
    frame_limit: Option<u64>,
    produced: u64,
}

impl BlankSource {
    pub fn new(config: &CameraConfig) -> Self {
        info!(
            "Synthetic frame source {}x{} @ {}fps",
            config.width, config.height, config.fps
        );
        Self {
            width: config.width,
            height: config.height,
            fps: config.fps,
            interval_ns: config.frame_interval_ns(),
            frame_limit: config.frame_limit,
            produced: 0,
        }
    }
}

impl FrameSource for BlankSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if self.frame_limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }

        let frame = VideoFrame::blank(
            self.width,
            self.height,
            self.produced * self.interval_ns,
            self.produced as u32,
        );
        self.produced += 1;
        Ok(Some(frame))
    }

    fn fps(&self) -> u32 {
        self.fps
    }
}

/// Recorded frames stored as individual image files, played in name order
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    fps: u32,
    interval_ns: u64,
    next: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, config: &CameraConfig) -> Result<Self, CameraError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();

        if let Some(limit) = config.frame_limit {
            paths.truncate(limit as usize);
        }

        if paths.is_empty() {
            warn!("No image frames found in {}", dir.display());
        } else {
            info!("Replaying {} frames from {}", paths.len(), dir.display());
        }

        Ok(Self {
            paths,
            fps: config.fps,
            interval_ns: config.frame_interval_ns(),
            next: 0,
        })
    }

    /// Number of frames in the sequence
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let index = self.next as u64;

        debug!("Decoding frame {} from {}", index, path.display());
        let image = image::open(path).map_err(|e| CameraError::Decode {
            index,
            reason: e.to_string(),
        })?;

        self.next += 1;
        Ok(Some(VideoFrame::from_image(
            image.to_rgb8(),
            index * self.interval_ns,
            index as u32,
        )))
    }

    fn fps(&self) -> u32 {
        self.fps
    }
}
