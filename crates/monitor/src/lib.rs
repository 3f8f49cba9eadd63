//! Driver Distraction Monitor
//!
//! Wires a frame source, a landmark detector, the distraction state machine,
//! the buzzer and the overlay renderer into one monitoring session.

pub mod overlay;
pub mod session;
pub mod settings;

pub use overlay::{FrameSink, Overlay, OverlayText, TracingFrameSink};
pub use session::{Session, SessionEnd, SessionSummary};
pub use settings::{ClockMode, LogFormat, Settings};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Settings(#[from] config::ConfigError),

    #[error(transparent)]
    Camera(#[from] camera_capture::CameraError),

    #[error(transparent)]
    Dms(#[from] dms::DmsError),

    #[error(transparent)]
    Alert(#[from] alerting::AlertError),

    #[error("Frame {sequence} has a malformed pixel buffer")]
    FrameBuffer { sequence: u32 },

    #[error("Failed to set tracing subscriber: {0}")]
    Logging(String),
}

/// Initialize logging
pub fn init_logging(level: Level, format: LogFormat) -> Result<(), MonitorError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    result.map_err(|e| MonitorError::Logging(e.to_string()))
}
