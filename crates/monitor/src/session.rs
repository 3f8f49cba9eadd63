//! Monitoring session: capture -> landmarks -> state machine -> buzzer + overlay

use std::future::Future;
use std::time::{Duration, Instant};

use alerting::AlertManager;
use camera_capture::{CameraConfig, FrameSource, VideoFrame};
use dms::{DistractionMonitor, DmsAnalysis, LandmarkDetector, ReplayDetector, SinkCommand};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::overlay::{FrameSink, Overlay, TracingFrameSink};
use crate::settings::{ClockMode, Settings};
use crate::MonitorError;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    EndOfStream,
    Interrupted,
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    /// Buzzer playback sessions started
    pub alerts_started: usize,
    /// Stop requests issued by the state machine
    pub stop_requests: usize,
    pub end: Option<SessionEnd>,
}

/// One monitored camera session.
///
/// Owns the distraction state for its lifetime and guarantees the buzzer is
/// silent when the session ends, whatever the reason.
pub struct Session {
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    monitor: DistractionMonitor,
    alerts: AlertManager,
    frame_sink: Box<dyn FrameSink>,
    clock: ClockMode,
    origin: Instant,
    paced: bool,
    frames: u64,
}

impl Session {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
        monitor: DistractionMonitor,
        alerts: AlertManager,
        frame_sink: Box<dyn FrameSink>,
    ) -> Self {
        Self {
            source,
            detector,
            monitor,
            alerts,
            frame_sink,
            clock: ClockMode::Wall,
            origin: Instant::now(),
            paced: true,
            frames: 0,
        }
    }

    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }

    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// Assemble a session from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, MonitorError> {
        let path = settings.landmarks.as_ref().ok_or_else(|| {
            MonitorError::Config("no landmark source configured (set `landmarks`)".to_string())
        })?;
        let detector = ReplayDetector::open(path)?;

        // Frames past the end of the recording have no landmarks
        let recorded = detector.len() as u64;
        let camera = CameraConfig {
            frame_limit: Some(settings.camera.frame_limit.map_or(recorded, |l| l.min(recorded))),
            ..settings.camera.clone()
        };
        let source = camera.open()?;

        let monitor = DistractionMonitor::new(settings.dms.clone())?;
        let alerts = AlertManager::from_config(&settings.alert)?;

        Ok(Self::new(
            source,
            Box::new(detector),
            monitor,
            alerts,
            Box::new(TracingFrameSink::default()),
        )
        .with_clock(settings.clock)
        .paced(settings.paced))
    }

    /// Process one frame; `None` at end of stream
    pub fn step(&mut self) -> Result<Option<DmsAnalysis>, MonitorError> {
        let Some(frame) = self.source.next_frame()? else {
            return Ok(None);
        };

        let faces = self.detector.detect(&frame)?;
        let now = self.now(&frame);
        let analysis = self.monitor.analyze(&faces, frame.width, frame.height, now);

        let state = self.monitor.state();
        debug!(
            "Frame {}: eye {:?}, look-away {:?}",
            frame.sequence,
            state.eye_phase(),
            state.look_away_phase()
        );
        if analysis.sink_command == SinkCommand::Start {
            if let Some(alert) = analysis.highest_severity_alert() {
                warn!("Frame {}: {}", frame.sequence, alert.message());
            }
        }

        self.apply(analysis.sink_command);
        self.render(&frame, &analysis)?;

        self.frames += 1;
        Ok(Some(analysis))
    }

    /// Run until the stream ends, an error occurs or `shutdown` completes
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<SessionSummary, MonitorError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = self.ticker();
        info!(
            "Monitoring session started ({:?} clock, {})",
            self.clock,
            if ticker.is_some() { "paced" } else { "unpaced" }
        );

        let result = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Interrupted, ending session");
                    break Ok(SessionEnd::Interrupted);
                }
                _ = next_tick(&mut ticker) => {}
            }

            match self.step() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!("End of stream after {} frames", self.frames);
                    break Ok(SessionEnd::EndOfStream);
                }
                Err(e) => {
                    error!("Session failed: {}", e);
                    break Err(e);
                }
            }
        };

        self.finish();
        let end = result?;
        Ok(SessionSummary {
            end: Some(end),
            ..self.summary()
        })
    }

    /// Run until the stream ends or Ctrl-C
    pub async fn run(&mut self) -> Result<SessionSummary, MonitorError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            frames: self.frames,
            alerts_started: self.alerts.start_count(),
            stop_requests: self.alerts.stop_count(),
            end: None,
        }
    }

    pub fn monitor(&self) -> &DistractionMonitor {
        &self.monitor
    }

    fn now(&self, frame: &VideoFrame) -> Instant {
        match self.clock {
            ClockMode::Wall => Instant::now(),
            ClockMode::Frame => self.origin + Duration::from_nanos(frame.timestamp_ns),
        }
    }

    fn apply(&mut self, command: SinkCommand) {
        let result = match command {
            SinkCommand::Hold => return,
            SinkCommand::Start => self.alerts.request_start(),
            SinkCommand::Stop => self.alerts.request_stop(),
        };
        if let Err(e) = result {
            error!("Alert sink failed on {:?}: {}", command, e);
        }
    }

    fn render(&mut self, frame: &VideoFrame, analysis: &DmsAnalysis) -> Result<(), MonitorError> {
        let overlay = Overlay::from_analysis(analysis);
        let mut image = frame.to_rgb_image().ok_or(MonitorError::FrameBuffer {
            sequence: frame.sequence,
        })?;
        overlay.draw(&mut image);
        self.frame_sink.present(&image, &overlay)
    }

    fn ticker(&self) -> Option<Interval> {
        if !self.paced {
            return None;
        }
        let fps = self.source.fps().max(1);
        let mut interval = tokio::time::interval(Duration::from_secs(1) / fps);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Some(interval)
    }

    fn finish(&mut self) {
        if let Err(e) = self.alerts.shutdown() {
            error!("Failed to silence alert: {}", e);
        }
        debug!("Session summary: {:?}", self.summary());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}
