pub mod actions;
pub mod app;
pub mod classifier;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod frame;
pub mod gesture;
pub mod host;
pub mod interactive;
pub mod landmarks;
pub mod smoothing;

pub use actions::{ActionExecutor, CaptureMetadata, CaptureStats, ClickOutcome};
pub use app::{ComponentState, HandnavOrchestrator, ShutdownReason};
pub use classifier::{classify, GestureClassification};
pub use config::HandnavConfig;
pub use driver::{FrameLoop, FrameSource, LandmarkDetector, LoopStats, ReplayDetector};
pub use error::{HandnavError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, HandnavEvent};
pub use frame::VideoFrame;
pub use gesture::{CaptureKind, GestureAction, GestureKind, GestureStateMachine, NavigationDirection};
pub use host::{Document, ElementHandle, HostServices, Notifier, OverlaySurface};
pub use interactive::{ElementInfo, HeuristicInteractivity, Interactivity};
pub use landmarks::{Landmark, LandmarkFrame};
pub use smoothing::{CursorPosition, CursorSmoother};
