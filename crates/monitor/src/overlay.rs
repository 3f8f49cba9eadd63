//! Frame annotation and the renderer seam

use dms::{DmsAlert, DmsAnalysis};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::{info, trace};

use crate::MonitorError;

const TIMER_COLOR: [u8; 3] = [0, 255, 255];
const DIRECTION_COLOR: [u8; 3] = [255, 255, 0];
const ALERT_COLOR: [u8; 3] = [255, 0, 0];
const EYE_COLOR: [u8; 3] = [0, 255, 0];
const ALERT_BORDER_PX: u32 = 3;

/// One line of overlay text
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    /// Baseline origin in pixels
    pub origin: (i32, i32),
    pub color: [u8; 3],
    pub scale: f32,
}

/// Everything the renderer shows for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overlay {
    pub lines: Vec<OverlayText>,
    /// Eye contour points (pixels)
    pub eye_points: Vec<(i32, i32)>,
    pub alert_active: bool,
}

impl Overlay {
    pub fn from_analysis(analysis: &DmsAnalysis) -> Self {
        let mut lines = vec![
            OverlayText {
                text: format!(
                    "Eye Closed Timer: {:.1}s",
                    analysis.eyes_closed_for.as_secs_f32()
                ),
                origin: (10, 30),
                color: TIMER_COLOR,
                scale: 0.8,
            },
            OverlayText {
                text: format!(
                    "Looking Away Timer: {:.1}s",
                    analysis.looking_away_for.as_secs_f32()
                ),
                origin: (10, 60),
                color: TIMER_COLOR,
                scale: 0.8,
            },
            OverlayText {
                text: format!("Direction: {}", analysis.classification.direction.label()),
                origin: (10, 90),
                color: DIRECTION_COLOR,
                scale: 0.8,
            },
        ];

        for alert in &analysis.alerts {
            let origin = match alert {
                DmsAlert::EyesClosed => (50, 100),
                DmsAlert::LookingAway(_) => (50, 150),
            };
            lines.push(OverlayText {
                text: alert.message(),
                origin,
                color: ALERT_COLOR,
                scale: 1.2,
            });
        }

        Self {
            lines,
            eye_points: analysis
                .eye_points
                .iter()
                .map(|p| (p.x as i32, p.y as i32))
                .collect(),
            alert_active: analysis.has_alerts(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    /// Paint eye points and, while alerting, a red frame border.
    ///
    /// Text lines are not rasterized here; the [`FrameSink`] renders
    /// [`Overlay::lines`] with its own font at their origins.
    pub fn draw(&self, image: &mut RgbImage) {
        for &center in &self.eye_points {
            draw_filled_circle_mut(image, center, 1, Rgb(EYE_COLOR));
        }

        if self.alert_active {
            let (width, height) = image.dimensions();
            for inset in 0..ALERT_BORDER_PX {
                if width <= 2 * inset || height <= 2 * inset {
                    break;
                }
                let rect = Rect::at(inset as i32, inset as i32)
                    .of_size(width - 2 * inset, height - 2 * inset);
                draw_hollow_rect_mut(image, rect, Rgb(ALERT_COLOR));
            }
        }
    }
}

/// Consumes annotated frames; purely a sink.
///
/// Receives the frame with eye points and border already painted, plus the
/// overlay whose text lines it is responsible for displaying.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), MonitorError>;
}

/// Headless renderer that logs status changes
#[derive(Debug, Default)]
pub struct TracingFrameSink {
    last_status: Vec<String>,
}

impl FrameSink for TracingFrameSink {
    fn present(&mut self, _frame: &RgbImage, overlay: &Overlay) -> Result<(), MonitorError> {
        // Timer lines change every frame; only direction and alerts are news
        let status: Vec<String> = overlay.lines.iter().skip(2).map(|l| l.text.clone()).collect();
        if status != self.last_status {
            info!("{}", status.join(" | "));
            self.last_status = status;
        }
        trace!("{}", overlay.texts().collect::<Vec<_>>().join(" | "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::{Classification, Direction, Point2, SinkCommand};
    use std::time::Duration;

    fn analysis(alerts: Vec<DmsAlert>) -> DmsAnalysis {
        DmsAnalysis {
            classification: Classification {
                eye_aspect_ratio: Some(0.1),
                eyes_closed: true,
                direction: Direction::Left,
            },
            eye_points: vec![Point2::new(20.7, 30.2), Point2::new(40.0, 30.0)],
            eyes_closed_for: Duration::from_millis(5240),
            looking_away_for: Duration::from_millis(12_000),
            alerts,
            eye_alert_armed: true,
            look_away_alert_armed: true,
            sink_command: SinkCommand::Hold,
        }
    }

    #[test]
    fn test_display_strings() {
        let overlay = Overlay::from_analysis(&analysis(vec![
            DmsAlert::EyesClosed,
            DmsAlert::LookingAway(Direction::Left),
        ]));

        let texts: Vec<_> = overlay.texts().collect();
        assert_eq!(
            texts,
            vec![
                "Eye Closed Timer: 5.2s",
                "Looking Away Timer: 12.0s",
                "Direction: Looking Left",
                "ALERT: Eyes Closed!",
                "ALERT: Looking Left!",
            ]
        );
        assert_eq!(overlay.lines[4].origin, (50, 150));
        assert_eq!(overlay.eye_points, vec![(20, 30), (40, 30)]);
        assert!(overlay.alert_active);
    }

    #[test]
    fn test_draw_marks_eyes_and_border() {
        let overlay = Overlay::from_analysis(&analysis(vec![DmsAlert::EyesClosed]));
        let mut image = RgbImage::new(64, 48);
        overlay.draw(&mut image);

        assert_eq!(image.get_pixel(20, 30).0, EYE_COLOR);
        assert_eq!(image.get_pixel(0, 0).0, ALERT_COLOR);
        assert_eq!(image.get_pixel(63, 47).0, ALERT_COLOR);
        assert_eq!(image.get_pixel(32, 10).0, [0, 0, 0]);
    }

    #[test]
    fn test_no_border_without_alert() {
        let overlay = Overlay::from_analysis(&analysis(vec![]));
        let mut image = RgbImage::new(64, 48);
        overlay.draw(&mut image);

        assert!(!overlay.alert_active);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(overlay.lines.len(), 3);
    }

    #[test]
    fn test_draw_leaves_text_to_the_sink() {
        let overlay = Overlay::from_analysis(&analysis(vec![]));
        let mut image = RgbImage::new(64, 48);
        overlay.draw(&mut image);

        // Only the two eye dots are painted; the text origins stay untouched
        let painted = image.pixels().filter(|p| p.0 != [0, 0, 0]).count();
        assert!(painted > 0 && painted <= 18);
        assert_eq!(image.get_pixel(10, 30).0, [0, 0, 0]);
    }

    #[test]
    fn test_tiny_frame_does_not_panic() {
        let overlay = Overlay::from_analysis(&analysis(vec![DmsAlert::EyesClosed]));
        let mut image = RgbImage::new(2, 2);
        overlay.draw(&mut image);
    }
}
