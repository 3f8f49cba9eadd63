//! Audible alert sinks

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::AlertError;

/// Looping audible alert.
///
/// `start` begins looping playback, `stop` halts it. Both must tolerate being
/// called in any state.
pub trait AlertSink: Send {
    fn start(&mut self) -> Result<(), AlertError>;

    fn stop(&mut self) -> Result<(), AlertError>;

    fn is_playing(&mut self) -> bool;
}

/// Headless sink that only logs
#[derive(Debug, Default)]
pub struct LoggingSink {
    playing: bool,
}

impl AlertSink for LoggingSink {
    fn start(&mut self) -> Result<(), AlertError> {
        warn!("BUZZER ON");
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AlertError> {
        if self.playing {
            info!("Buzzer off");
        }
        self.playing = false;
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        self.playing
    }
}

/// Counters kept by a [`MemorySink`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySinkLog {
    /// Playback sessions actually started
    pub starts: usize,
    /// Stop calls received
    pub stops: usize,
    pub playing: bool,
}

/// In-memory sink for dry runs and tests; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    log: Arc<Mutex<MemorySinkLog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters
    pub fn snapshot(&self) -> MemorySinkLog {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, MemorySinkLog> {
        // A poisoned log is still a valid set of counters
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AlertSink for MemorySink {
    fn start(&mut self) -> Result<(), AlertError> {
        let mut log = self.lock();
        if !log.playing {
            log.starts += 1;
            log.playing = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AlertError> {
        let mut log = self.lock();
        log.stops += 1;
        log.playing = false;
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        self.lock().playing
    }
}

/// Plays the alert through an external player process.
///
/// The command is expected to loop on its own, e.g.
/// `["mpv", "--really-quiet", "--loop=inf", "buzzer.mp3"]`. Stopping kills
/// the process.
pub struct CommandSink {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandSink {
    pub fn new(argv: &[String]) -> Result<Self, AlertError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| AlertError::Config("alert command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            child: None,
        })
    }
}

impl AlertSink for CommandSink {
    fn start(&mut self) -> Result<(), AlertError> {
        if self.is_playing() {
            return Ok(());
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AlertError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        info!("Alert player started: {} (pid {})", self.program, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AlertError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        // kill() fails if the player already exited; reaping below still applies
        if let Err(e) = child.kill() {
            debug!("Alert player already gone: {}", e);
        }
        child.wait().map_err(AlertError::Io)?;
        info!("Alert player stopped");
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("Alert player exited on its own: {}", status);
                self.child = None;
                false
            }
            Err(e) => {
                warn!("Cannot query alert player: {}", e);
                false
            }
        }
    }
}

impl Drop for CommandSink {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop alert player: {}", e);
        }
    }
}
