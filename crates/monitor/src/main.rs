//! Driver Distraction Monitor - Main Entry Point

use std::path::PathBuf;

use monitor::settings::DEFAULT_CONFIG_FILE;
use monitor::{init_logging, Session, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var_os("DISTRACTION_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let settings = Settings::load(Some(&config_path))?;
    init_logging(settings.log_level()?, settings.log_format)?;

    info!("=== Driver Distraction Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Settings from {} (if present) and DISTRACTION_* environment", config_path.display());

    let mut session = Session::from_settings(&settings)?;
    let summary = session.run().await?;

    info!(
        "Session ended ({:?}): {} frames, {} alert(s) raised",
        summary.end, summary.frames, summary.alerts_started
    );
    Ok(())
}
