//! Layered runtime settings: defaults, optional TOML file, environment

use std::path::{Path, PathBuf};

use alerting::AlertConfig;
use camera_capture::CameraConfig;
use config::{Config, Environment, File, Map};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::MonitorError;

/// Environment prefix; `DISTRACTION_DMS__EAR_THRESHOLD=0.22` sets `dms.ear_threshold`
pub const ENV_PREFIX: &str = "DISTRACTION";

/// Default settings file name
pub const DEFAULT_CONFIG_FILE: &str = "distraction.toml";

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Time base for the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    /// Monotonic wall clock at processing time
    #[default]
    Wall,
    /// Frame capture timestamps, for deterministic replays
    Frame,
}

/// Monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Recorded face-mesh landmarks (JSON lines)
    pub landmarks: Option<PathBuf>,
    pub clock: ClockMode,
    /// Process frames at the camera rate instead of as fast as possible
    pub paced: bool,
    pub camera: CameraConfig,
    pub dms: DmsConfig,
    pub alert: AlertConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            landmarks: None,
            clock: ClockMode::Wall,
            paced: true,
            camera: CameraConfig::default(),
            dms: DmsConfig::default(),
            alert: AlertConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings, layering an optional file and the environment over defaults
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment when given
    fn load_with_env(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, MonitorError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        // List values are space separated: DISTRACTION_ALERT__COMMAND="mpv --loop=inf buzzer.mp3"
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("alert.command")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        settings.dms.validate()?;
        settings.log_level()?;
        Ok(settings)
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level, MonitorError> {
        self.log_level
            .parse()
            .map_err(|_| MonitorError::Config(format!("unknown log level {:?}", self.log_level)))
    }
}
