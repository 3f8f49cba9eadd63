//! Alert Manager Implementation

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::sink::{AlertSink, CommandSink, LoggingSink};
use crate::AlertError;

/// Alert configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// External player command that loops the buzzer sound; logging only when unset
    pub command: Option<Vec<String>>,
}

/// Drives one alert sink on behalf of the state machine.
///
/// Start requests are idempotent (no-op while the sink plays), stop requests
/// are unconditional. The sink is stopped on `shutdown` and again on drop, so
/// every exit path of a session leaves the buzzer silent.
pub struct AlertManager {
    sink: Box<dyn AlertSink>,
    /// Sink has been started at least once
    engaged: bool,
    /// Underlying playback sessions started
    started: usize,
    /// Stop requests forwarded to the sink
    stopped: usize,
}

impl AlertManager {
    /// Create a new alert manager around a sink
    pub fn new(sink: Box<dyn AlertSink>) -> Self {
        Self {
            sink,
            engaged: false,
            started: 0,
            stopped: 0,
        }
    }

    /// Build the sink described by the configuration
    pub fn from_config(config: &AlertConfig) -> Result<Self, AlertError> {
        let sink: Box<dyn AlertSink> = match &config.command {
            Some(argv) => {
                info!("Audible alerts via {:?}", argv);
                Box::new(CommandSink::new(argv)?)
            }
            None => {
                warn!("No alert command configured. Alerts are logged only.");
                Box::new(LoggingSink::default())
            }
        };
        Ok(Self::new(sink))
    }

    /// Start the looping alert unless it already plays
    pub fn request_start(&mut self) -> Result<(), AlertError> {
        if self.sink.is_playing() {
            debug!("Alert already playing");
            return Ok(());
        }
        self.sink.start()?;
        self.engaged = true;
        self.started += 1;
        Ok(())
    }

    /// Stop the alert
    pub fn request_stop(&mut self) -> Result<(), AlertError> {
        self.stopped += 1;
        self.sink.stop()
    }

    /// Stop the alert at session end
    pub fn shutdown(&mut self) -> Result<(), AlertError> {
        if self.engaged {
            info!("Silencing alert for shutdown");
        }
        self.engaged = false;
        self.sink.stop()
    }

    pub fn is_playing(&mut self) -> bool {
        self.sink.is_playing()
    }

    /// Number of playback sessions started
    pub fn start_count(&self) -> usize {
        self.started
    }

    /// Number of stop requests
    pub fn stop_count(&self) -> usize {
        self.stopped
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(Box::new(LoggingSink::default()))
    }
}

impl Drop for AlertManager {
    fn drop(&mut self) {
        if !self.engaged {
            return;
        }
        if let Err(e) = self.sink.stop() {
            warn!("Failed to stop alert on drop: {}", e);
        }
    }
}
