use std::sync::Arc;
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::detector::LandmarkDetector;
use super::source::FrameSource;
use super::stats::LoopStats;
use crate::actions::ActionExecutor;
use crate::config::{DriverConfig, HandnavConfig};
use crate::error::{CameraError, HandnavError, Result};
use crate::events::{EventBus, HandnavEvent};
use crate::gesture::{GestureKind, GestureStateMachine};
use crate::host::HostServices;
use crate::interactive::Interactivity;
use crate::landmarks::LandmarkFrame;

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Continue,
    /// The camera stream has no more frames
    Ended,
}

/// Per-refresh driver: frame -> landmarks -> state machine -> host actions
pub struct FrameLoop {
    config: DriverConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    machine: GestureStateMachine,
    executor: Arc<ActionExecutor>,
    event_bus: Arc<EventBus>,
    stats: LoopStats,
    started_at: Instant,
    hand_present: bool,
    last_gesture: GestureKind,
    running: bool,
}

impl FrameLoop {
    pub fn new(
        config: &HandnavConfig,
        host: HostServices,
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let machine =
            GestureStateMachine::new(config, host.document.clone(), host.overlay.clone());
        let executor = Arc::new(ActionExecutor::new(config, host, Arc::clone(&event_bus)));

        Self {
            config: config.driver.clone(),
            source,
            detector,
            machine,
            executor,
            event_bus,
            stats: LoopStats::default(),
            started_at: Instant::now(),
            hand_present: false,
            last_gesture: GestureKind::NoHand,
            running: false,
        }
    }

    pub fn with_interactivity(mut self, interactivity: Arc<dyn Interactivity>) -> Self {
        self.machine = self.machine.with_interactivity(interactivity);
        self
    }

    pub fn executor(&self) -> Arc<ActionExecutor> {
        Arc::clone(&self.executor)
    }

    pub fn machine(&self) -> &GestureStateMachine {
        &self.machine
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Load the model, open the camera and install the overlay.
    ///
    /// On failure nothing is installed and the camera is left released.
    pub async fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(HandnavError::component("driver", "Frame loop already started"));
        }

        info!("Loading hand landmark model");
        self.detector.load().await?;

        info!("Acquiring camera stream");
        if let Err(e) = self.source.acquire().await {
            self.source.release().await;
            return Err(e.into());
        }

        self.executor.host().overlay.install();
        self.started_at = Instant::now();
        self.stats.reset();
        self.running = true;

        let _ = self
            .event_bus
            .publish(HandnavEvent::TrackingStarted {
                timestamp: std::time::SystemTime::now(),
            })
            .await;
        info!("Hand tracking started");
        Ok(())
    }

    /// Process one frame. A failed detection is logged and leaves the
    /// gesture state untouched.
    pub async fn tick(&mut self, now: Instant) -> Result<TickStatus> {
        let frame = match self.source.next_frame().await {
            Ok(frame) => frame,
            Err(CameraError::StreamEnded) => {
                info!("Camera stream ended");
                return Ok(TickStatus::Ended);
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping frame: {}", e);
                self.stats.record_frame_error();
                return Ok(TickStatus::Continue);
            }
            Err(e) => return Err(e.into()),
        };

        let timestamp_ms = now.saturating_duration_since(self.started_at).as_secs_f64() * 1000.0;
        let landmarks = match self.detector.detect(&frame, timestamp_ms).await {
            Ok(landmarks) => landmarks,
            Err(e) => {
                warn!("Landmark detection failed on frame {}: {}", frame.id, e);
                self.stats.record_inference_error();
                return Ok(TickStatus::Continue);
            }
        };

        let hand = landmarks.as_deref().and_then(LandmarkFrame::from_points);
        let actions = self.machine.process(hand.as_ref(), now);
        self.publish_transitions(hand.is_some()).await;

        if !actions.is_empty() {
            debug!("Frame {} produced {} actions", frame.id, actions.len());
        }
        self.executor.apply(&actions).await;
        self.stats.record_tick(hand.is_some(), actions.len());

        Ok(TickStatus::Continue)
    }

    async fn publish_transitions(&mut self, hand_present: bool) {
        let timestamp = std::time::SystemTime::now();

        if hand_present != self.hand_present {
            self.hand_present = hand_present;
            let event = if hand_present {
                HandnavEvent::HandDetected { timestamp }
            } else {
                HandnavEvent::HandLost { timestamp }
            };
            let _ = self.event_bus.publish(event).await;
        }

        let gesture = self.machine.last_gesture();
        if gesture != self.last_gesture {
            self.last_gesture = gesture;
            let _ = self
                .event_bus
                .publish(HandnavEvent::GestureChanged { gesture, timestamp })
                .await;
        }
    }

    /// Tick once per refresh until cancelled or the stream ends, then tear
    /// down. Cancellation is observed between ticks.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        if !self.running {
            self.start().await?;
        }

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Frame loop running at {}Hz", self.config.refresh_hz);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Frame loop cancelled");
                    break Ok(());
                }
                _ = interval.tick() => {
                    let now = tokio::time::Instant::now().into_std();
                    match self.tick(now).await {
                        Ok(TickStatus::Continue) => {}
                        Ok(TickStatus::Ended) => break Ok(()),
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        self.stop().await;
        result
    }

    /// Release the camera and remove every overlay element
    pub async fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        let actions = self.machine.reset();
        self.executor.apply(&actions).await;
        self.source.release().await;

        let overlay = &self.executor.host().overlay;
        overlay.hide_cursor();
        overlay.hide_click_progress();
        overlay.remove();

        let _ = self
            .event_bus
            .publish(HandnavEvent::TrackingStopped {
                timestamp: std::time::SystemTime::now(),
            })
            .await;
        info!(
            "Hand tracking stopped after {} ticks ({:.0}% with a hand)",
            self.stats.ticks,
            self.stats.detection_rate() * 100.0
        );
    }
}
