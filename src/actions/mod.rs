//! Side effects for the actions decided by the gesture state machine.

pub mod capture;
pub mod click;
pub mod cursor;
pub mod metadata;
pub mod motion;


use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{CaptureConfig, CursorConfig, HandnavConfig};
use crate::events::{EventBus, HandnavEvent};
use crate::gesture::{CaptureKind, GestureAction};
use crate::host::{ElementHandle, HostServices, NotificationKind, NotifyOptions};
use crate::smoothing::CursorPosition;

pub use capture::{capture_exclusions, capture_filename};
pub use click::{dispatch_click, ClickOutcome};
pub use metadata::{CaptureMetadata, CaptureStats};

use capture::CaptureJob;

const CLICK_NOTIFICATION: Duration = Duration::from_millis(1000);

/// Applies gesture actions to the host, in order
pub struct ActionExecutor {
    cursor: CursorConfig,
    capture: CaptureConfig,
    host: HostServices,
    event_bus: Arc<EventBus>,
    captures: Mutex<Vec<JoinHandle<()>>>,
    capture_stats: Arc<Mutex<CaptureStats>>,
}

impl ActionExecutor {
    pub fn new(config: &HandnavConfig, host: HostServices, event_bus: Arc<EventBus>) -> Self {
        Self {
            cursor: config.cursor.clone(),
            capture: config.capture.clone(),
            host,
            event_bus,
            captures: Mutex::new(Vec::new()),
            capture_stats: Arc::new(Mutex::new(CaptureStats::default())),
        }
    }

    pub fn host(&self) -> &HostServices {
        &self.host
    }

    pub async fn apply(&self, actions: &[GestureAction]) {
        for action in actions {
            self.apply_one(action).await;
        }
    }

    pub async fn apply_one(&self, action: &GestureAction) {
        let overlay = self.host.overlay.as_ref();
        match action {
            GestureAction::MoveCursor(position) => {
                cursor::place_cursor(overlay, *position, self.cursor.marker_size);
            }
            GestureAction::HideCursor => overlay.hide_cursor(),
            GestureAction::ClickProgress { position, progress } => {
                cursor::show_progress(overlay, *position, *progress);
            }
            GestureAction::ClickConfirmed { position } => cursor::show_confirmed(overlay, *position),
            GestureAction::HideClickProgress => overlay.hide_click_progress(),
            GestureAction::Scroll { delta_y } => {
                motion::scroll(self.host.document.as_ref(), *delta_y);
                let _ = self
                    .event_bus
                    .publish(HandnavEvent::ScrollTriggered { delta_y: *delta_y })
                    .await;
            }
            GestureAction::Navigate(direction) => {
                motion::navigate(self.host.navigator.as_ref(), *direction);
                let _ = self
                    .event_bus
                    .publish(HandnavEvent::NavigationTriggered {
                        direction: *direction,
                    })
                    .await;
            }
            GestureAction::Click { target, position } => self.click(*target, *position).await,
            GestureAction::Capture(kind) => self.spawn_capture(*kind),
        }
    }

    async fn click(&self, target: ElementHandle, position: CursorPosition) {
        match dispatch_click(self.host.document.as_ref(), target, position) {
            Ok(ClickOutcome::Dispatched) => {
                self.host.notifier.notify(
                    NotificationKind::Success,
                    "Click executed!",
                    NotifyOptions::auto_close(CLICK_NOTIFICATION),
                );
                let _ = self
                    .event_bus
                    .publish(HandnavEvent::ClickExecuted {
                        element: target.0,
                        x: position.x,
                        y: position.y,
                    })
                    .await;
            }
            Ok(ClickOutcome::TargetGone) => {}
            Err(e) => warn!("Click on {} was not delivered: {}", target, e),
        }
    }

    /// Start a capture on its own task; the tick loop does not wait for it
    fn spawn_capture(&self, kind: CaptureKind) {
        let job = CaptureJob {
            capture_id: Uuid::new_v4().to_string(),
            kind,
            config: self.capture.clone(),
            host: self.host.clone(),
            event_bus: Arc::clone(&self.event_bus),
        };
        debug!("Starting {} capture {}", kind, job.capture_id);

        self.capture_stats.lock().in_flight += 1;
        let stats = Arc::clone(&self.capture_stats);
        let handle = tokio::spawn(async move {
            let saved = job.run().await;
            let mut stats = stats.lock();
            stats.in_flight = stats.in_flight.saturating_sub(1);
            if saved {
                stats.completed += 1;
            } else {
                stats.failed += 1;
            }
        });

        let mut captures = self.captures.lock();
        captures.retain(|capture| !capture.is_finished());
        captures.push(handle);
    }

    /// Wait for every capture started so far
    pub async fn wait_for_captures(&self) {
        let handles = std::mem::take(&mut *self.captures.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Capture task ended abnormally: {}", e);
            }
        }
    }

    pub fn capture_stats(&self) -> CaptureStats {
        self.capture_stats.lock().clone()
    }
}
