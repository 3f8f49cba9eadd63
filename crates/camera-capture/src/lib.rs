//! Camera Capture Library for the Distraction Monitor
//!
//! Frame sources feeding the driver-facing pipeline. The monitor only needs
//! "next frame or end of stream", so every backend implements [`FrameSource`].
//! Supports:
//! - Synthetic blank frames (landmark replay sessions)
//! - Recorded image sequences (one decoded image per frame)

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{BlankSource, ImageSequenceSource};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open source: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Failed to decode frame {index}: {reason}")]
    Decode { index: u64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of video frames.
///
/// `Ok(None)` signals end of stream; the session loop stops cleanly on it.
pub trait FrameSource: Send {
    /// Read the next frame
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Nominal frame rate, used for pacing
    fn fps(&self) -> u32;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        (**self).next_frame()
    }

    fn fps(&self) -> u32 {
        (**self).fps()
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Target FPS
    pub fps: u32,
    /// Directory of recorded frames; synthetic frames are produced when unset
    pub frames_dir: Option<PathBuf>,
    /// Stop after this many frames
    pub frame_limit: Option<u64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 15,
            frames_dir: None,
            frame_limit: None,
        }
    }
}

impl CameraConfig {
    /// Interval between two frames at the configured rate
    pub fn frame_interval_ns(&self) -> u64 {
        1_000_000_000 / u64::from(self.fps.max(1))
    }

    /// Open the source described by this configuration
    pub fn open(&self) -> Result<Box<dyn FrameSource>, CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Format(format!(
                "frame size {}x{} is empty",
                self.width, self.height
            )));
        }

        match &self.frames_dir {
            Some(dir) => Ok(Box::new(ImageSequenceSource::open(dir, self)?)),
            None => Ok(Box::new(BlankSource::new(self))),
        }
    }
}
