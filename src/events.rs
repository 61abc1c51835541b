use crate::error::EventBusError;
use crate::gesture::{CaptureKind, GestureKind, NavigationDirection};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events published while tracking hand gestures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HandnavEvent {
    /// Tracking is running against an acquired camera stream
    TrackingStarted { timestamp: SystemTime },
    /// Model or camera initialization failed; gestures are disabled
    TrackingUnavailable { reason: String },
    /// Tracking stopped and the camera was released
    TrackingStopped { timestamp: SystemTime },
    /// A hand entered the frame
    HandDetected { timestamp: SystemTime },
    /// The hand left the frame
    HandLost { timestamp: SystemTime },
    /// The recognized gesture changed
    GestureChanged {
        gesture: GestureKind,
        timestamp: SystemTime,
    },
    /// The page was scrolled
    ScrollTriggered { delta_y: f64 },
    /// History navigation was requested
    NavigationTriggered { direction: NavigationDirection },
    /// Mouse events were dispatched on an element
    ClickExecuted { element: u64, x: f64, y: f64 },
    /// A capture has started
    CaptureStarted { capture_id: String, kind: CaptureKind },
    /// A capture was saved
    CaptureCompleted {
        capture_id: String,
        kind: CaptureKind,
        filename: String,
    },
    /// A capture failed; overlays have been restored
    CaptureFailed {
        capture_id: String,
        kind: CaptureKind,
        error: String,
    },
    /// A system error occurred in a component
    SystemError { component: String, error: String },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl HandnavEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            HandnavEvent::TrackingStarted { .. } => "Hand tracking started".to_string(),
            HandnavEvent::TrackingUnavailable { reason } => {
                format!("Hand tracking unavailable: {}", reason)
            }
            HandnavEvent::TrackingStopped { .. } => "Hand tracking stopped".to_string(),
            HandnavEvent::HandDetected { .. } => "Hand detected".to_string(),
            HandnavEvent::HandLost { .. } => "Hand lost".to_string(),
            HandnavEvent::GestureChanged { gesture, .. } => {
                format!("Gesture changed to {}", gesture)
            }
            HandnavEvent::ScrollTriggered { delta_y } => format!("Scrolled by {:.0}px", delta_y),
            HandnavEvent::NavigationTriggered { direction } => {
                format!("Navigated {:?}", direction)
            }
            HandnavEvent::ClickExecuted { element, x, y } => {
                format!("Clicked element {} at ({:.0}, {:.0})", element, x, y)
            }
            HandnavEvent::CaptureStarted { capture_id, kind } => {
                format!("Capture started: {} ({})", capture_id, kind)
            }
            HandnavEvent::CaptureCompleted {
                capture_id,
                filename,
                ..
            } => {
                format!("Capture completed: {} -> {}", capture_id, filename)
            }
            HandnavEvent::CaptureFailed {
                capture_id, error, ..
            } => {
                format!("Capture failed: {} ({})", capture_id, error)
            }
            HandnavEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            HandnavEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            HandnavEvent::TrackingStarted { .. } => "tracking_started",
            HandnavEvent::TrackingUnavailable { .. } => "tracking_unavailable",
            HandnavEvent::TrackingStopped { .. } => "tracking_stopped",
            HandnavEvent::HandDetected { .. } => "hand_detected",
            HandnavEvent::HandLost { .. } => "hand_lost",
            HandnavEvent::GestureChanged { .. } => "gesture_changed",
            HandnavEvent::ScrollTriggered { .. } => "scroll_triggered",
            HandnavEvent::NavigationTriggered { .. } => "navigation_triggered",
            HandnavEvent::ClickExecuted { .. } => "click_executed",
            HandnavEvent::CaptureStarted { .. } => "capture_started",
            HandnavEvent::CaptureCompleted { .. } => "capture_completed",
            HandnavEvent::CaptureFailed { .. } => "capture_failed",
            HandnavEvent::SystemError { .. } => "system_error",
            HandnavEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<HandnavEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<HandnavEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: HandnavEvent) -> Result<usize, EventBusError> {
        match &event {
            HandnavEvent::TrackingUnavailable { reason } => {
                warn!("Hand tracking unavailable: {}", reason);
            }
            HandnavEvent::CaptureFailed { capture_id, error, .. } => {
                warn!("Capture {} failed: {}", capture_id, error);
            }
            HandnavEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            HandnavEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {}
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &HandnavEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<HandnavEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(
        receiver: broadcast::Receiver<HandnavEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<HandnavEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<HandnavEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}
