use super::orchestrator::send_shutdown;
use super::{ComponentState, HandnavOrchestrator, ShutdownReason};
use crate::error::{EventBusError, HandnavError, Result};
use crate::events::{EventFilter, EventReceiver, HandnavEvent};
use crate::host::{NotificationKind, NotifyOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const LOADING_MESSAGE: &str = "Initializing hand gesture detection...";
pub const READY_MESSAGE: &str = "Camera initialized! Hand gesture detection is now active.";

pub const HELP_LINES: [&str; 6] = [
    "Index finger only: Move cursor + scroll",
    "Hold cursor on clickable element (1.5s): Click",
    "Two fingers: Scroll down",
    "Four fingers: Swipe",
    "Fist (hold 2.5s): Screenshot",
    "Palm (hold 2.5s): Full page screenshot",
];

const LOADING_DISMISS_DELAY: Duration = Duration::from_millis(1000);
const READY_AUTO_CLOSE: Duration = Duration::from_millis(3000);
const HELP_AUTO_CLOSE: Duration = Duration::from_millis(8000);

/// Gesture cheat sheet, one gesture per line
pub fn help_text() -> String {
    HELP_LINES.join("\n")
}

impl HandnavOrchestrator {
    /// Initialize all system components
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing handnav components");

        let mut states = self.component_states.lock().await;
        states.insert("tracking".to_string(), ComponentState::Stopped);
        states.insert("capture".to_string(), ComponentState::Stopped);
        drop(states);

        self.spawn_event_logger();

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start tracking. A model or camera failure is reported and leaves
    /// the page without gestures; it is not an error for the caller.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting hand tracking");

        let mut frame_loop = self
            .frame_loop
            .take()
            .ok_or_else(|| HandnavError::system("Hand tracking already started"))?;

        self.set_component_state("tracking", ComponentState::Starting)
            .await;

        if let Err(e) = frame_loop.start().await {
            error!("Failed to initialize hand tracking: {}", e);
            self.frame_loop = Some(frame_loop);
            self.tracking_available = false;
            self.set_component_state("tracking", ComponentState::Failed)
                .await;

            let _ = self
                .event_bus
                .publish(HandnavEvent::TrackingUnavailable {
                    reason: e.to_string(),
                })
                .await;
            let _ = self
                .event_bus
                .publish(HandnavEvent::SystemError {
                    component: "tracking".to_string(),
                    error: e.to_string(),
                })
                .await;
            return Ok(());
        }

        self.tracking_available = true;
        self.announce_ready();

        let cancel = self.cancellation_token.child_token();
        let shutdown_sender = Arc::clone(&self.shutdown_sender);
        self.loop_task = Some(tokio::spawn(async move {
            let result = frame_loop.run(cancel.clone()).await;
            match &result {
                Err(e) => {
                    send_shutdown(&shutdown_sender, ShutdownReason::Error(e.to_string())).await
                }
                Ok(()) if !cancel.is_cancelled() => {
                    send_shutdown(&shutdown_sender, ShutdownReason::StreamEnded).await
                }
                Ok(()) => {}
            }
            (frame_loop, result)
        }));

        self.set_component_state("tracking", ComponentState::Running)
            .await;
        self.set_component_state("capture", ComponentState::Running)
            .await;
        info!("Hand tracking started successfully");
        Ok(())
    }

    /// Log every published event until shutdown
    fn spawn_event_logger(&self) {
        let mut receiver = EventReceiver::new(
            self.event_bus.subscribe(),
            EventFilter::All,
            "orchestrator".to_string(),
        );
        let cancel = self.cancellation_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = receiver.recv() => match event {
                        Ok(event) => debug!("[{}] {}", event.event_type(), event.description()),
                        Err(EventBusError::ChannelClosed) => break,
                        Err(e) => warn!("Event logger: {}", e),
                    },
                }
            }
        });
    }

    /// Startup notifications: a loading note that clears shortly after the
    /// camera is live, then a ready note followed by the gesture help
    fn announce_ready(&self) {
        let notifier = Arc::clone(&self.host.notifier);

        let loading = notifier.notify(
            NotificationKind::Info,
            LOADING_MESSAGE,
            NotifyOptions::persistent(),
        );
        let dismisser = Arc::clone(&notifier);
        tokio::spawn(async move {
            tokio::time::sleep(LOADING_DISMISS_DELAY).await;
            dismisser.dismiss(loading);
        });

        let mut options = NotifyOptions::auto_close(READY_AUTO_CLOSE);
        if self.config.driver.show_help {
            let help_notifier = Arc::clone(&notifier);
            options = options.on_close(move || {
                help_notifier.notify(
                    NotificationKind::Info,
                    &help_text(),
                    NotifyOptions::auto_close(HELP_AUTO_CLOSE),
                );
            });
        }
        notifier.notify(NotificationKind::Success, READY_MESSAGE, options);
    }
}
