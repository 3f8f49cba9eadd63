//! Alerting System
//!
//! Looping audible alert behind the [`AlertSink`] seam, driven idempotently
//! by the [`AlertManager`].

mod manager;
pub mod sink;

pub use manager::{AlertConfig, AlertManager};
pub use sink::{AlertSink, CommandSink, LoggingSink, MemorySink, MemorySinkLog};

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert configuration error: {0}")]
    Config(String),

    #[error("Failed to launch alert player {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("Alert player I/O error: {0}")]
    Io(#[from] std::io::Error),
}
