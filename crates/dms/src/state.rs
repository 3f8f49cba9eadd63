//! Distraction state machine
//!
//! Two independent alert axes (eye closure, look-away) share one recovery
//! clock and one buzzer. An axis arms once its condition has held for the
//! axis threshold; arming asks the sink to start. When a condition clears
//! while anything is armed, the recovery clock (re)starts, and once it has
//! run for the grace period both axes disarm and the sink is stopped.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::Classification;
use crate::config::DmsConfig;

/// Request for the alert sink produced by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SinkCommand {
    /// Leave the sink as it is
    #[default]
    Hold,
    /// Start the looping alert (no-op if already playing)
    Start,
    /// Stop the alert
    Stop,
}

/// Tracking state of one alert axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisState {
    /// Condition not present, alert not armed
    #[default]
    Clear,
    /// Condition present since `since`, below threshold
    Accumulating { since: Instant },
    /// Alert armed; `since` is the current condition onset, if the
    /// condition is still (or again) present
    Armed { since: Option<Instant> },
}

impl AxisState {
    /// Onset of the current condition
    pub fn onset(&self) -> Option<Instant> {
        match *self {
            AxisState::Clear => None,
            AxisState::Accumulating { since } => Some(since),
            AxisState::Armed { since } => since,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, AxisState::Armed { .. })
    }

    fn track(&mut self, active: bool, now: Instant, threshold: Duration) -> AxisTick {
        let mut tick = AxisTick::default();

        if !active {
            tick.cleared = self.onset().is_some();
            *self = match *self {
                AxisState::Armed { .. } => AxisState::Armed { since: None },
                _ => AxisState::Clear,
            };
            return tick;
        }

        let since = match *self {
            AxisState::Clear => {
                *self = AxisState::Accumulating { since: now };
                now
            }
            AxisState::Accumulating { since } => since,
            AxisState::Armed { since: Some(since) } => since,
            AxisState::Armed { since: None } => {
                tick.retriggered = true;
                *self = AxisState::Armed { since: Some(now) };
                now
            }
        };

        tick.elapsed = now.saturating_duration_since(since);
        if tick.elapsed >= threshold {
            tick.alerting = true;
            if let AxisState::Accumulating { since } = *self {
                *self = AxisState::Armed { since: Some(since) };
                tick.armed_now = true;
            }
        }

        tick
    }

    /// Drop the armed flag, keeping any ongoing condition onset
    fn disarm(&mut self) {
        *self = match *self {
            AxisState::Armed { since: Some(since) } => AxisState::Accumulating { since },
            AxisState::Armed { since: None } => AxisState::Clear,
            other => other,
        };
    }
}

#[derive(Debug, Default)]
struct AxisTick {
    elapsed: Duration,
    alerting: bool,
    armed_now: bool,
    retriggered: bool,
    cleared: bool,
}

/// Coarse phase of an axis, for display and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisPhase {
    Clear,
    Accumulating,
    Armed,
    Recovering,
}

/// Timing thresholds of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub eye_closed: Duration,
    pub look_away: Duration,
    pub recovery: Duration,
}

impl From<&DmsConfig> for Thresholds {
    fn from(config: &DmsConfig) -> Self {
        Self {
            eye_closed: config.eye_closed_threshold(),
            look_away: config.look_away_threshold(),
            recovery: config.recovery_delay(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&DmsConfig::default())
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Continuous eye closure so far (zero when open)
    pub eyes_closed_for: Duration,
    /// Continuous look-away so far (zero when forward)
    pub looking_away_for: Duration,
    /// Eye closure has reached its threshold this tick
    pub eyes_closed_alert: bool,
    /// Look-away has reached its threshold this tick
    pub looking_away_alert: bool,
    pub command: SinkCommand,
}

/// Driver distraction state, tracked across frames
#[derive(Debug, Clone, Default)]
pub struct DistractionState {
    eye: AxisState,
    look_away: AxisState,
    recovery: Option<Instant>,
}

impl DistractionState {
    /// Advance the state machine by one frame
    pub fn update(
        &mut self,
        classification: &Classification,
        now: Instant,
        thresholds: &Thresholds,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let mut start = false;

        if classification.face_detected() {
            let eye = self.eye.track(classification.eyes_closed, now, thresholds.eye_closed);
            if eye.retriggered {
                self.cancel_recovery("eye closure resumed");
            }
            if eye.armed_now {
                info!("Eye closure alert armed after {:.1}s", eye.elapsed.as_secs_f32());
                self.cancel_recovery("eye closure alert armed");
                start = true;
            }
            if eye.cleared && self.eye.is_armed() {
                self.begin_recovery(now, "eyes reopened");
            }
            outcome.eyes_closed_for = eye.elapsed;
            outcome.eyes_closed_alert = eye.alerting;

            let away = self.look_away.track(
                classification.direction.is_away(),
                now,
                thresholds.look_away,
            );
            if away.retriggered {
                self.cancel_recovery("look-away resumed");
            }
            if away.armed_now {
                info!(
                    "Look-away alert armed after {:.1}s ({})",
                    away.elapsed.as_secs_f32(),
                    classification.direction.label()
                );
                self.cancel_recovery("look-away alert armed");
                start = true;
            }
            if away.cleared && self.any_armed() {
                self.begin_recovery(now, "facing forward");
            }
            outcome.looking_away_for = away.elapsed;
            outcome.looking_away_alert = away.alerting;
        } else {
            let eye = self.eye.track(false, now, thresholds.eye_closed);
            let away = self.look_away.track(false, now, thresholds.look_away);
            if (eye.cleared || away.cleared) && self.any_armed() {
                self.begin_recovery(now, "face lost");
            }
        }

        outcome.command = if start { SinkCommand::Start } else { SinkCommand::Hold };

        if let Some(since) = self.recovery {
            if now.saturating_duration_since(since) >= thresholds.recovery {
                info!("Driver attentive for {:?}, stopping alert", thresholds.recovery);
                self.eye.disarm();
                self.look_away.disarm();
                self.recovery = None;
                outcome.command = SinkCommand::Stop;
            }
        }

        outcome
    }

    fn begin_recovery(&mut self, now: Instant, reason: &str) {
        debug!("Recovery timer started: {}", reason);
        self.recovery = Some(now);
    }

    fn cancel_recovery(&mut self, reason: &str) {
        if self.recovery.take().is_some() {
            debug!("Recovery cancelled: {}", reason);
        }
    }

    pub fn eye(&self) -> AxisState {
        self.eye
    }

    pub fn look_away(&self) -> AxisState {
        self.look_away
    }

    pub fn eye_close_started(&self) -> Option<Instant> {
        self.eye.onset()
    }

    pub fn look_away_started(&self) -> Option<Instant> {
        self.look_away.onset()
    }

    /// Start of the pending recovery grace window
    pub fn recovery_started(&self) -> Option<Instant> {
        self.recovery
    }

    pub fn eye_alert_armed(&self) -> bool {
        self.eye.is_armed()
    }

    pub fn look_away_alert_armed(&self) -> bool {
        self.look_away.is_armed()
    }

    pub fn any_armed(&self) -> bool {
        self.eye.is_armed() || self.look_away.is_armed()
    }

    pub fn eye_phase(&self) -> AxisPhase {
        self.phase_of(self.eye)
    }

    pub fn look_away_phase(&self) -> AxisPhase {
        self.phase_of(self.look_away)
    }

    fn phase_of(&self, axis: AxisState) -> AxisPhase {
        match axis {
            AxisState::Clear => AxisPhase::Clear,
            AxisState::Accumulating { .. } => AxisPhase::Accumulating,
            AxisState::Armed { since: None } if self.recovery.is_some() => AxisPhase::Recovering,
            AxisState::Armed { .. } => AxisPhase::Armed,
        }
    }

    /// Reset state (on driver change)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
