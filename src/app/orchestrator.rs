use super::types::{ComponentState, ShutdownReason};
use crate::actions::ActionExecutor;
use crate::config::HandnavConfig;
use crate::driver::{FrameLoop, FrameSource, LandmarkDetector};
use crate::error::Result;
use crate::events::EventBus;
use crate::host::HostServices;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub(super) type SharedShutdownSender = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

/// Main application coordinator: owns the frame loop and its host and
/// drives startup, signal handling and shutdown
pub struct HandnavOrchestrator {
    pub(super) config: HandnavConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) host: HostServices,
    pub(super) executor: Arc<ActionExecutor>,

    // The loop lives here until started, then inside its task
    pub(super) frame_loop: Option<FrameLoop>,
    pub(super) loop_task: Option<JoinHandle<(FrameLoop, Result<()>)>>,
    pub(super) tracking_available: bool,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: SharedShutdownSender,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl HandnavOrchestrator {
    /// Create a new orchestrator with the given configuration, host and
    /// camera/model pair
    pub async fn new(
        config: HandnavConfig,
        host: HostServices,
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
    ) -> Result<Self> {
        config.validate()?;

        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let frame_loop = FrameLoop::new(
            &config,
            host.clone(),
            source,
            detector,
            Arc::clone(&event_bus),
        );
        let executor = frame_loop.executor();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        Ok(Self {
            config,
            event_bus,
            host,
            executor,
            frame_loop: Some(frame_loop),
            loop_task: None,
            tracking_available: false,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_sender))),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn config(&self) -> &HandnavConfig {
        &self.config
    }

    /// Ask a running orchestrator to shut down
    pub async fn request_shutdown(&self, reason: ShutdownReason) {
        send_shutdown(&self.shutdown_sender, reason).await;
    }
}

/// First request wins; later ones are dropped
pub(super) async fn send_shutdown(sender: &SharedShutdownSender, reason: ShutdownReason) {
    match sender.lock().await.take() {
        Some(sender) => {
            let _ = sender.send(reason);
        }
        None => warn!("Shutdown already requested, ignoring {}", reason),
    }
}
