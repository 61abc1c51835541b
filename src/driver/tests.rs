use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::classifier::fixtures::*;
use crate::config::HandnavConfig;
use crate::error::{CameraError, HandnavError, InferenceError};
use crate::events::{EventBus, EventFilter, EventReceiver};
use crate::frame::VideoFrame;
use crate::gesture::GestureKind;
use crate::host::{
    BlankRasterizer, FileDownloader, HeadlessDocument, HostServices, LogNotifier,
    RecordingNavigator, RecordingOverlay,
};
use crate::landmarks::{Landmark, LandmarkFrame};

/// Detector returning a fixed script of results, then no hand
struct ScriptedDetector {
    script: VecDeque<Result<Option<Vec<Landmark>>, InferenceError>>,
    fail_load: bool,
}

impl ScriptedDetector {
    fn new(script: Vec<Result<Option<Vec<Landmark>>, InferenceError>>) -> Self {
        Self {
            script: script.into(),
            fail_load: false,
        }
    }

    fn failing_load() -> Self {
        Self {
            script: VecDeque::new(),
            fail_load: true,
        }
    }
}

#[async_trait]
impl LandmarkDetector for ScriptedDetector {
    async fn load(&mut self) -> Result<(), InferenceError> {
        if self.fail_load {
            return Err(InferenceError::ModelLoad {
                details: "weights unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn detect(
        &mut self,
        _frame: &VideoFrame,
        _timestamp_ms: f64,
    ) -> Result<Option<Vec<Landmark>>, InferenceError> {
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

fn hand(frame: LandmarkFrame) -> Result<Option<Vec<Landmark>>, InferenceError> {
    Ok(Some(frame.points().to_vec()))
}

fn detection_error() -> Result<Option<Vec<Landmark>>, InferenceError> {
    Err(InferenceError::Detection {
        details: "model busy".to_string(),
    })
}

struct Fixture {
    overlay: Arc<RecordingOverlay>,
    notifier: Arc<LogNotifier>,
    event_bus: Arc<EventBus>,
    config: HandnavConfig,
    host: HostServices,
    _temp_dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let mut config = HandnavConfig::default();
        config.capture.path = temp_dir.path().to_string_lossy().to_string();
        config.capture.settle_ms = 1;

        let overlay = Arc::new(RecordingOverlay::new());
        let notifier = Arc::new(LogNotifier::new());
        let host = HostServices {
            document: Arc::new(HeadlessDocument::new(config.cursor.viewport, (1280, 2000))),
            overlay: overlay.clone(),
            navigator: Arc::new(RecordingNavigator::new()),
            notifier: notifier.clone(),
            rasterizer: Arc::new(BlankRasterizer::new()),
            downloader: Arc::new(FileDownloader::new(temp_dir.path())),
        };

        Self {
            overlay,
            notifier,
            event_bus: Arc::new(EventBus::new(64)),
            config,
            host,
            _temp_dir: temp_dir,
        }
    }

    fn frame_loop(&self, source: SyntheticFrameSource, detector: impl LandmarkDetector + 'static) -> FrameLoop {
        FrameLoop::new(
            &self.config,
            self.host.clone(),
            Box::new(source),
            Box::new(detector),
            Arc::clone(&self.event_bus),
        )
    }

    fn source(&self) -> SyntheticFrameSource {
        SyntheticFrameSource::new(self.config.camera.clone())
    }

    fn receiver(&self, types: Vec<&'static str>) -> EventReceiver {
        EventReceiver::new(
            self.event_bus.subscribe(),
            EventFilter::EventTypes(types),
            "test".to_string(),
        )
    }
}

fn drain(receiver: &mut EventReceiver) -> Vec<&'static str> {
    let mut types = Vec::new();
    while let Ok(Some(event)) = receiver.try_recv() {
        types.push(event.event_type());
    }
    types
}

#[tokio::test]
async fn test_start_installs_overlay_and_stop_removes_it() {
    let fixture = Fixture::new();
    let mut receiver = fixture.receiver(vec!["tracking_started", "tracking_stopped"]);
    let mut frame_loop = fixture.frame_loop(
        fixture.source(),
        ScriptedDetector::new(vec![hand(index_only_at(0.5, 0.5))]),
    );

    frame_loop.start().await.unwrap();
    assert!(frame_loop.is_running());
    assert!(fixture.overlay.state().installed);

    frame_loop.tick(Instant::now()).await.unwrap();
    assert!(fixture.overlay.state().cursor.is_some());

    frame_loop.stop().await;
    let state = fixture.overlay.state();
    assert!(!state.installed);
    assert_eq!(state.cursor, None);
    assert_eq!(state.click_progress, None);
    assert!(!frame_loop.is_running());

    assert_eq!(drain(&mut receiver), vec!["tracking_started", "tracking_stopped"]);
}

#[tokio::test]
async fn test_restart_begins_fresh_stats() {
    let fixture = Fixture::new();
    let mut frame_loop = fixture.frame_loop(
        fixture.source(),
        ScriptedDetector::new(vec![hand(index_only_at(0.5, 0.5)), Ok(None)]),
    );

    frame_loop.start().await.unwrap();
    frame_loop.tick(Instant::now()).await.unwrap();
    frame_loop.tick(Instant::now()).await.unwrap();
    frame_loop.stop().await;
    assert_eq!(frame_loop.stats().ticks, 2);

    frame_loop.start().await.unwrap();
    assert_eq!(frame_loop.stats().ticks, 0);
    assert_eq!(frame_loop.stats().frames_with_hand, 0);
    frame_loop.stop().await;
}

#[tokio::test]
async fn test_denied_camera_leaves_page_untouched() {
    let fixture = Fixture::new();
    let source = SyntheticFrameSource::denied(fixture.config.camera.clone());
    let mut frame_loop = fixture.frame_loop(source, ScriptedDetector::new(vec![]));

    let result = frame_loop.start().await;
    assert!(matches!(
        result,
        Err(HandnavError::Camera(CameraError::PermissionDenied))
    ));
    assert!(!frame_loop.is_running());
    assert!(!fixture.overlay.state().installed);
}

#[tokio::test]
async fn test_model_load_failure_aborts_start() {
    let fixture = Fixture::new();
    let mut frame_loop = fixture.frame_loop(fixture.source(), ScriptedDetector::failing_load());

    let result = frame_loop.start().await;
    assert!(matches!(
        result,
        Err(HandnavError::Inference(InferenceError::ModelLoad { .. }))
    ));
    assert!(!fixture.overlay.state().installed);
}

#[tokio::test]
async fn test_detection_failure_keeps_gesture_state() {
    let fixture = Fixture::new();
    let mut frame_loop = fixture.frame_loop(
        fixture.source(),
        ScriptedDetector::new(vec![
            hand(fist()),
            detection_error(),
            hand(fist()),
        ]),
    );
    frame_loop.start().await.unwrap();

    let t0 = Instant::now();
    frame_loop.tick(t0).await.unwrap();
    assert!(frame_loop.machine().state().fist.is_active());

    frame_loop.tick(t0 + Duration::from_millis(1500)).await.unwrap();
    assert!(frame_loop.machine().state().fist.is_active());
    assert_eq!(frame_loop.stats().inference_errors, 1);

    frame_loop.tick(t0 + Duration::from_millis(2500)).await.unwrap();
    assert!(frame_loop.machine().state().fist.has_fired());

    let executor = frame_loop.executor();
    executor.wait_for_captures().await;
    assert_eq!(executor.capture_stats().completed, 1);
    assert!(fixture
        .notifier
        .messages()
        .contains(&"Screenshot saved successfully!".to_string()));
}

#[tokio::test]
async fn test_hand_and_gesture_transitions_are_published() {
    let fixture = Fixture::new();
    let mut receiver = fixture.receiver(vec!["hand_detected", "hand_lost", "gesture_changed"]);
    let mut frame_loop = fixture.frame_loop(
        fixture.source(),
        ScriptedDetector::new(vec![
            hand(index_only_at(0.5, 0.5)),
            hand(index_only_at(0.52, 0.5)),
            hand(palm()),
            Ok(None),
        ]),
    );
    frame_loop.start().await.unwrap();

    let t0 = Instant::now();
    for i in 0..4 {
        frame_loop.tick(t0 + Duration::from_millis(16 * i)).await.unwrap();
    }

    assert_eq!(
        drain(&mut receiver),
        vec![
            "hand_detected",
            "gesture_changed",
            "gesture_changed",
            "hand_lost",
            "gesture_changed",
        ]
    );
    assert_eq!(frame_loop.machine().last_gesture(), GestureKind::NoHand);
    assert_eq!(frame_loop.stats().frames_with_hand, 3);
}

#[tokio::test]
async fn test_partial_landmark_list_counts_as_no_hand() {
    let fixture = Fixture::new();
    let partial: Vec<Landmark> = index_only_at(0.5, 0.5).points()[..10].to_vec();
    let mut frame_loop = fixture.frame_loop(
        fixture.source(),
        ScriptedDetector::new(vec![hand(index_only_at(0.5, 0.5)), Ok(Some(partial))]),
    );
    frame_loop.start().await.unwrap();

    let t0 = Instant::now();
    frame_loop.tick(t0).await.unwrap();
    assert!(fixture.overlay.state().cursor.is_some());

    frame_loop.tick(t0 + Duration::from_millis(16)).await.unwrap();
    assert_eq!(fixture.overlay.state().cursor, None);
    assert_eq!(frame_loop.stats().frames_with_hand, 1);
}

#[tokio::test]
async fn test_run_stops_when_stream_ends() {
    let fixture = Fixture::new();
    let frames = (0..3)
        .map(|i| Some(index_only_at(0.4 + 0.05 * i as f64, 0.5).points().to_vec()))
        .collect();
    let mut frame_loop = fixture.frame_loop(
        fixture.source().with_frame_limit(3),
        ReplayDetector::from_frames(frames),
    );

    frame_loop.run(CancellationToken::new()).await.unwrap();

    assert_eq!(frame_loop.stats().ticks, 3);
    assert!(!frame_loop.is_running());
    assert!(!fixture.overlay.state().installed);
}

#[tokio::test]
async fn test_run_observes_cancellation() {
    let fixture = Fixture::new();
    let mut frame_loop = fixture.frame_loop(fixture.source(), ScriptedDetector::new(vec![]));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        trigger.cancel();
    });

    tokio::time::timeout(Duration::from_secs(2), frame_loop.run(cancel))
        .await
        .expect("frame loop did not stop")
        .unwrap();

    assert!(frame_loop.stats().ticks >= 1);
    assert!(!fixture.overlay.state().installed);
}

#[tokio::test]
async fn test_synthetic_source_lifecycle() {
    let fixture = Fixture::new();
    let mut source = fixture.source().with_frame_limit(2);

    assert!(matches!(
        source.next_frame().await,
        Err(CameraError::NotAcquired)
    ));

    source.acquire().await.unwrap();
    assert!(source.is_acquired());
    let first = source.next_frame().await.unwrap();
    let second = source.next_frame().await.unwrap();
    assert_eq!((first.id, second.id), (0, 1));
    assert_eq!((first.width, first.height), fixture.config.camera.resolution);
    assert!(matches!(
        source.next_frame().await,
        Err(CameraError::StreamEnded)
    ));

    source.release().await;
    assert!(!source.is_acquired());
    assert_eq!(source.frames_delivered(), 2);
}

#[tokio::test]
async fn test_replay_detector_parses_recordings() {
    let content = r#"
null
[[0.1, 0.2, 0.3], [0.4, 0.5]]

[{"x": 0.6, "y": 0.7}]
"#;
    let mut detector = ReplayDetector::from_jsonl_str(content).unwrap();
    assert_eq!(detector.len(), 3);

    let frame = VideoFrame::empty(0, 640, 480);
    assert_eq!(detector.detect(&frame, 0.0).await.unwrap(), None);
    assert_eq!(
        detector.detect(&frame, 16.0).await.unwrap(),
        Some(vec![Landmark::new(0.1, 0.2, 0.3), Landmark::new(0.4, 0.5, 0.0)])
    );
    assert_eq!(
        detector.detect(&frame, 32.0).await.unwrap(),
        Some(vec![Landmark::new(0.6, 0.7, 0.0)])
    );
    assert_eq!(detector.remaining(), 0);
    assert_eq!(detector.detect(&frame, 48.0).await.unwrap(), None);
}

#[test]
fn test_replay_detector_reports_bad_line() {
    let err = ReplayDetector::from_jsonl_str("null\n[[0.1, \"x\"]]\n").unwrap_err();
    match err {
        InferenceError::Malformed { details } => assert!(details.starts_with("line 2:")),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_replay_detector_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.jsonl");
    std::fs::write(&path, "null\nnull\n").unwrap();

    let detector = ReplayDetector::from_file(&path).await.unwrap();
    assert_eq!(detector.len(), 2);

    let missing = ReplayDetector::from_file(temp_dir.path().join("missing.jsonl")).await;
    assert!(matches!(missing, Err(InferenceError::ModelLoad { .. })));
}

#[test]
fn test_loop_stats() {
    let mut stats = LoopStats::default();
    assert_eq!(stats.detection_rate(), 0.0);

    stats.record_tick(true, 3);
    stats.record_tick(false, 1);
    stats.record_inference_error();
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.actions_applied, 4);
    assert_eq!(stats.detection_rate(), 0.5);
    assert!(stats.last_tick_time.is_some());

    stats.reset();
    assert_eq!(stats.ticks, 0);
    assert_eq!(stats.inference_errors, 0);
}
