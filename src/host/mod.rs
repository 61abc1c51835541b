//! Collaborators supplied by the embedding host.
//!
//! The gesture core never touches a real document, camera overlay or
//! download mechanism directly; it talks to these traits. `headless`
//! provides in-memory implementations used by the replay binary and tests.

pub mod headless;


use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CaptureError, HostError};
use crate::interactive::ElementInfo;

pub use headless::{
    BlankRasterizer, FileDownloader, HeadlessDocument, LogNotifier, NotificationRecord,
    OverlayState, Rect, RecordingNavigator, RecordingOverlay, DISPATCH_LOG_LIMIT,
    NOTIFICATION_HISTORY_LIMIT,
};

/// Opaque identity of a host element. Equality is identity; the core never
/// owns the element behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventKind {
    MouseDown,
    MouseUp,
    Click,
}

impl MouseEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            MouseEventKind::MouseDown => "mousedown",
            MouseEventKind::MouseUp => "mouseup",
            MouseEventKind::Click => "click",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticMouseEvent {
    pub kind: MouseEventKind,
    pub client_x: f64,
    pub client_y: f64,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl SyntheticMouseEvent {
    /// Bubbling, cancelable event at viewport coordinates
    pub fn new(kind: MouseEventKind, client_x: f64, client_y: f64) -> Self {
        Self {
            kind,
            client_x,
            client_y,
            bubbles: true,
            cancelable: true,
        }
    }
}

/// The page being controlled
pub trait Document: Send + Sync {
    /// Visible viewport size in pixels
    fn viewport(&self) -> (u32, u32);

    /// Full scrollable extent in pixels
    fn document_size(&self) -> (u32, u32);

    fn scroll_offset(&self) -> (f64, f64);

    fn scroll_by(&self, dx: f64, dy: f64);

    fn body(&self) -> ElementHandle;

    fn is_body(&self, element: ElementHandle) -> bool {
        element == self.body()
    }

    /// Topmost element at viewport coordinates
    fn element_from_point(&self, x: f64, y: f64) -> Option<ElementHandle>;

    fn parent(&self, element: ElementHandle) -> Option<ElementHandle>;

    /// Snapshot used for clickability checks; `None` once the element is gone
    fn describe(&self, element: ElementHandle) -> Option<ElementInfo>;

    fn dispatch_mouse_event(
        &self,
        element: ElementHandle,
        event: &SyntheticMouseEvent,
    ) -> Result<(), HostError>;
}

/// Elements the overlay adds to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayElement {
    Cursor,
    ClickProgress,
    VideoFeed,
    DetectionCanvas,
}

impl OverlayElement {
    pub const ALL: [OverlayElement; 4] = [
        OverlayElement::Cursor,
        OverlayElement::ClickProgress,
        OverlayElement::VideoFeed,
        OverlayElement::DetectionCanvas,
    ];
}

/// Visual state of the click-progress ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProgressIndicator {
    /// Fraction of the hold completed, in `[0, 1]`
    Filling(f64),
    Confirmed,
}

pub trait OverlaySurface: Send + Sync {
    /// Create the cursor marker and click-progress indicator
    fn install(&self);

    /// Remove everything `install` created
    fn remove(&self);

    fn is_installed(&self) -> bool;

    fn show_cursor(&self, left: f64, top: f64);

    fn hide_cursor(&self);

    fn show_click_progress(&self, x: f64, y: f64, indicator: ProgressIndicator);

    fn hide_click_progress(&self);

    /// Toggle the camera preview and detection canvas
    fn set_feed_visible(&self, visible: bool);

    fn element(&self, element: OverlayElement) -> Option<ElementHandle>;
}

pub trait Navigator: Send + Sync {
    fn go_back(&self);
    fn go_forward(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle(pub u64);

pub type CloseCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
pub struct NotifyOptions {
    /// Close automatically after this delay; `None` keeps it until dismissed
    pub auto_close: Option<Duration>,
    /// Invoked once the notification auto-closes
    pub on_close: Option<CloseCallback>,
}

impl NotifyOptions {
    pub fn persistent() -> Self {
        Self::default()
    }

    pub fn auto_close(delay: Duration) -> Self {
        Self {
            auto_close: Some(delay),
            on_close: None,
        }
    }

    pub fn on_close<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for NotifyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyOptions")
            .field("auto_close", &self.auto_close)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        kind: NotificationKind,
        message: &str,
        options: NotifyOptions,
    ) -> NotificationHandle;

    fn dismiss(&self, handle: NotificationHandle);

    /// Class of the container holding notifications, excluded from captures
    fn container_class(&self) -> Option<String> {
        None
    }
}

/// What a capture must leave out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureExclusions {
    pub elements: Vec<ElementHandle>,
    /// Uppercase tag names
    pub tags: Vec<String>,
    pub classes: Vec<String>,
}

impl CaptureExclusions {
    pub fn excludes(&self, element: ElementHandle, info: &ElementInfo) -> bool {
        if self.elements.contains(&element) {
            return true;
        }
        if self
            .tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(&info.tag))
        {
            return true;
        }
        match info.class_name.as_deref() {
            Some(class_name) => class_name
                .split_whitespace()
                .any(|class| self.classes.iter().any(|excluded| excluded == class)),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterizeRequest {
    pub root: ElementHandle,
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    pub scale: f64,
    /// Offset applied to the rendered content, if any
    pub translate: Option<(f64, f64)>,
    pub exclusions: CaptureExclusions,
}

/// Renders part of the document to an image data URI
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, request: RasterizeRequest) -> Result<String, CaptureError>;
}

/// Persists an image data URI under the given filename. Returns the saved location.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn save(&self, data_uri: &str, filename: &str) -> Result<String, CaptureError>;
}

/// Bundle of host collaborators shared between the state machine, the
/// executors and the driver
#[derive(Clone)]
pub struct HostServices {
    pub document: Arc<dyn Document>,
    pub overlay: Arc<dyn OverlaySurface>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub downloader: Arc<dyn Downloader>,
}

impl HostServices {
    /// Fully in-memory host: a blank document of the given viewport size,
    /// recording overlay and navigator, logging notifier, placeholder
    /// rasterizer and a downloader writing into `capture_dir`.
    pub fn headless(viewport: (u32, u32), capture_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            document: Arc::new(HeadlessDocument::new(viewport, viewport)),
            overlay: Arc::new(RecordingOverlay::new()),
            navigator: Arc::new(RecordingNavigator::new()),
            notifier: Arc::new(LogNotifier::new()),
            rasterizer: Arc::new(BlankRasterizer::new()),
            downloader: Arc::new(FileDownloader::new(capture_dir)),
        }
    }
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("viewport", &self.document.viewport())
            .finish_non_exhaustive()
    }
}
