//! End-to-end session tests with scripted landmarks and an in-memory buzzer

use std::sync::{Arc, Mutex};

use alerting::{AlertManager, MemorySink};
use camera_capture::{BlankSource, CameraConfig, VideoFrame};
use dms::landmarks::fixtures;
use dms::{DistractionMonitor, DmsConfig, DmsError, LandmarkDetector, LandmarkFrame};
use image::RgbImage;
use monitor::{ClockMode, FrameSink, MonitorError, Overlay, Session, SessionEnd, Settings};
use tokio::sync::oneshot;

/// Face centred at normalized `nose_x`; `openness` 0.25 is open, 0.05 closed
fn face(nose_x: f32, openness: f32) -> LandmarkFrame {
    fixtures::face(nose_x, 0.5, 0.4, openness)
}

/// Detector scripted by frame sequence number
struct ScriptedDetector<F>(F);

impl<F> LandmarkDetector for ScriptedDetector<F>
where
    F: FnMut(u32) -> Result<Vec<LandmarkFrame>, DmsError> + Send,
{
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkFrame>, DmsError> {
        (self.0)(frame.sequence)
    }
}

/// Keeps overlay text; optionally signals after a number of frames
#[derive(Default)]
struct RecordingSink {
    texts: Arc<Mutex<Vec<Vec<String>>>>,
    signal: Option<(usize, oneshot::Sender<()>)>,
}

impl FrameSink for RecordingSink {
    fn present(&mut self, _frame: &RgbImage, overlay: &Overlay) -> Result<(), MonitorError> {
        let mut texts = self.texts.lock().unwrap();
        texts.push(overlay.texts().map(str::to_string).collect());

        if self.signal.as_ref().is_some_and(|(after, _)| texts.len() >= *after) {
            if let Some((_, tx)) = self.signal.take() {
                let _ = tx.send(());
            }
        }
        Ok(())
    }
}

fn camera(limit: Option<u64>) -> CameraConfig {
    CameraConfig {
        width: 640,
        height: 480,
        fps: 10,
        frames_dir: None,
        frame_limit: limit,
    }
}

fn session<F>(limit: Option<u64>, script: F, buzzer: &MemorySink, frames: RecordingSink) -> Session
where
    F: FnMut(u32) -> Result<Vec<LandmarkFrame>, DmsError> + Send + 'static,
{
    Session::new(
        Box::new(BlankSource::new(&camera(limit))),
        Box::new(ScriptedDetector(script)),
        DistractionMonitor::new(DmsConfig::default()).unwrap(),
        AlertManager::new(Box::new(buzzer.clone())),
        Box::new(frames),
    )
    .with_clock(ClockMode::Frame)
    .paced(false)
}

#[tokio::test]
async fn test_eye_closure_alert_and_recovery() {
    let buzzer = MemorySink::new();
    let frames = RecordingSink::default();
    let texts = frames.texts.clone();

    // 6s eyes closed, then 3s attentive, at 10 fps
    let mut session = session(
        Some(90),
        |seq| Ok(vec![face(0.5, if seq < 60 { 0.05 } else { 0.25 })]),
        &buzzer,
        frames,
    );

    let summary = session.run_until(std::future::pending()).await.unwrap();

    assert_eq!(summary.end, Some(SessionEnd::EndOfStream));
    assert_eq!(summary.frames, 90);
    assert_eq!(summary.alerts_started, 1);
    assert_eq!(summary.stop_requests, 1);

    let log = buzzer.snapshot();
    assert_eq!(log.starts, 1);
    assert!(!log.playing);

    let texts = texts.lock().unwrap();
    assert!(!texts[49].contains(&"ALERT: Eyes Closed!".to_string()));
    assert!(texts[50].contains(&"ALERT: Eyes Closed!".to_string()));
    assert_eq!(texts[50][0], "Eye Closed Timer: 5.0s");
    assert_eq!(texts[60][0], "Eye Closed Timer: 0.0s");
    assert_eq!(texts[60][2], "Direction: Forward");
}

#[tokio::test]
async fn test_interrupt_silences_buzzer() {
    let buzzer = MemorySink::new();
    let (tx, rx) = oneshot::channel();
    let frames = RecordingSink {
        signal: Some((60, tx)),
        ..Default::default()
    };

    let mut session = session(None, |_| Ok(vec![face(0.5, 0.05)]), &buzzer, frames);
    let summary = session
        .run_until(async {
            let _ = rx.await;
        })
        .await
        .unwrap();

    assert_eq!(summary.end, Some(SessionEnd::Interrupted));
    assert_eq!(summary.frames, 60);
    assert_eq!(summary.alerts_started, 1);
    assert_eq!(summary.stop_requests, 0);

    // Playing when interrupted, silenced by the session
    assert!(!buzzer.snapshot().playing);
}

#[tokio::test]
async fn test_detector_failure_ends_session_silently() {
    let buzzer = MemorySink::new();
    let mut session = session(
        None,
        |seq| {
            if seq < 55 {
                Ok(vec![face(0.5, 0.05)])
            } else {
                Err(DmsError::ReplayExhausted)
            }
        },
        &buzzer,
        RecordingSink::default(),
    );

    let result = session.run_until(std::future::pending()).await;
    assert!(matches!(
        result,
        Err(MonitorError::Dms(DmsError::ReplayExhausted))
    ));
    assert_eq!(buzzer.snapshot().starts, 1);
    assert!(!buzzer.snapshot().playing);
}

#[tokio::test]
async fn test_face_loss_and_look_away() {
    let buzzer = MemorySink::new();
    let frames = RecordingSink::default();
    let texts = frames.texts.clone();

    // 11s looking left, 3s without a face
    let mut session = session(
        Some(140),
        |seq| Ok(if seq < 110 { vec![face(0.25, 0.25)] } else { vec![] }),
        &buzzer,
        frames,
    );

    let summary = session.run_until(std::future::pending()).await.unwrap();
    assert_eq!(summary.alerts_started, 1);
    assert_eq!(summary.stop_requests, 1);
    assert!(!session.monitor().state().any_armed());

    let texts = texts.lock().unwrap();
    assert!(texts[100].contains(&"ALERT: Looking Left!".to_string()));
    assert_eq!(texts[110][2], "Direction: No Face Detected");
    assert_eq!(texts[110][1], "Looking Away Timer: 0.0s");
}

#[tokio::test(start_paused = true)]
async fn test_paced_session_follows_camera_rate() {
    let buzzer = MemorySink::new();
    let mut session = session(Some(5), |_| Ok(vec![]), &buzzer, RecordingSink::default()).paced(true);

    let started = tokio::time::Instant::now();
    let summary = session.run_until(std::future::pending()).await.unwrap();

    assert_eq!(summary.frames, 5);
    // First tick is immediate, the remaining four are 100ms apart
    assert!(started.elapsed() >= std::time::Duration::from_millis(400));
}

#[tokio::test]
async fn test_session_from_settings_replays_recording() {
    let path = std::env::temp_dir().join(format!("monitor-replay-{}.jsonl", std::process::id()));
    let lines: Vec<String> = (0..70)
        .map(|seq| {
            let openness = if seq < 60 { 0.05 } else { 0.25 };
            serde_json::json!({ "faces": [face(0.5, openness)] }).to_string()
        })
        .collect();
    std::fs::write(&path, lines.join("\n")).unwrap();

    let settings = Settings {
        landmarks: Some(path.clone()),
        clock: ClockMode::Frame,
        paced: false,
        camera: camera(None),
        ..Default::default()
    };

    let mut session = Session::from_settings(&settings).unwrap();
    let summary = session.run_until(std::future::pending()).await.unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(summary.end, Some(SessionEnd::EndOfStream));
    assert_eq!(summary.frames, 70);
    assert_eq!(summary.alerts_started, 1);
    assert_eq!(summary.stop_requests, 0);
}

#[tokio::test]
async fn test_image_frames_beyond_recording_end_cleanly() {
    let dir = std::env::temp_dir().join(format!("monitor-frames-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    for i in 0..3 {
        RgbImage::new(64, 48)
            .save(dir.join(format!("frame_{:03}.png", i)))
            .unwrap();
    }
    let landmarks = dir.join("landmarks.jsonl");
    std::fs::write(&landmarks, "{\"faces\": []}\n{\"faces\": []}\n").unwrap();

    let settings = Settings {
        landmarks: Some(landmarks),
        clock: ClockMode::Frame,
        paced: false,
        camera: CameraConfig {
            frames_dir: Some(dir.clone()),
            ..camera(None)
        },
        ..Default::default()
    };

    let mut session = Session::from_settings(&settings).unwrap();
    let result = session.run_until(std::future::pending()).await;
    let _ = std::fs::remove_dir_all(&dir);

    let summary = result.unwrap();
    assert_eq!(summary.end, Some(SessionEnd::EndOfStream));
    assert_eq!(summary.frames, 2);
}

#[test]
fn test_session_requires_landmarks() {
    let result = Session::from_settings(&Settings::default());
    assert!(matches!(result, Err(MonitorError::Config(_))));
}
