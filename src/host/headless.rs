//! In-memory host used for landmark replay and tests without a browser.

use async_trait::async_trait;
use base64::Engine;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{
    Document, Downloader, ElementHandle, Navigator, NotificationHandle,
    NotificationKind, Notifier, NotifyOptions, OverlayElement, OverlaySurface, ProgressIndicator,
    RasterizeRequest, Rasterizer, SyntheticMouseEvent,
};
use crate::error::{CaptureError, HostError};
use crate::interactive::ElementInfo;

/// Mouse events kept by a headless document before the oldest are dropped
pub const DISPATCH_LOG_LIMIT: usize = 1024;

/// Notifications kept by `LogNotifier` before closed ones are dropped
pub const NOTIFICATION_HISTORY_LIMIT: usize = 256;

/// Axis-aligned rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ElementHandle>,
    rect: Rect,
    info: ElementInfo,
}

#[derive(Debug)]
struct DocumentTree {
    nodes: HashMap<ElementHandle, Node>,
    /// Paint order, last is topmost
    order: Vec<ElementHandle>,
    next_id: u64,
    scroll: (f64, f64),
    dispatched: VecDeque<(ElementHandle, SyntheticMouseEvent)>,
    dispatch_limit: usize,
}

/// Element tree with rectangle hit testing, scroll offset and a log of
/// dispatched mouse events
#[derive(Debug)]
pub struct HeadlessDocument {
    viewport: (u32, u32),
    document_size: (u32, u32),
    body: ElementHandle,
    tree: RwLock<DocumentTree>,
}

impl HeadlessDocument {
    pub fn new(viewport: (u32, u32), document_size: (u32, u32)) -> Self {
        let body = ElementHandle(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            Node {
                parent: None,
                rect: Rect::new(0.0, 0.0, viewport.0 as f64, viewport.1 as f64),
                info: ElementInfo::new("body"),
            },
        );

        Self {
            viewport,
            document_size: (
                document_size.0.max(viewport.0),
                document_size.1.max(viewport.1),
            ),
            body,
            tree: RwLock::new(DocumentTree {
                nodes,
                order: vec![body],
                next_id: 2,
                scroll: (0.0, 0.0),
                dispatched: VecDeque::new(),
                dispatch_limit: DISPATCH_LOG_LIMIT,
            }),
        }
    }

    /// Keep at most `limit` dispatched events
    pub fn with_dispatch_limit(self, limit: usize) -> Self {
        {
            let mut tree = self.tree.write();
            tree.dispatch_limit = limit.max(1);
            while tree.dispatched.len() > tree.dispatch_limit {
                tree.dispatched.pop_front();
            }
        }
        self
    }

    /// Append an element above everything added so far
    pub fn add_element(&self, parent: ElementHandle, rect: Rect, info: ElementInfo) -> ElementHandle {
        let mut tree = self.tree.write();
        let handle = ElementHandle(tree.next_id);
        tree.next_id += 1;
        tree.nodes.insert(
            handle,
            Node {
                parent: Some(parent),
                rect,
                info,
            },
        );
        tree.order.push(handle);
        handle
    }

    /// Remove an element and all of its descendants
    pub fn detach(&self, element: ElementHandle) {
        let mut tree = self.tree.write();
        let mut removed = vec![element];
        let mut index = 0;
        while index < removed.len() {
            let current = removed[index];
            let children: Vec<ElementHandle> = tree
                .nodes
                .iter()
                .filter(|(_, node)| node.parent == Some(current))
                .map(|(handle, _)| *handle)
                .collect();
            removed.extend(children);
            index += 1;
        }
        for handle in &removed {
            tree.nodes.remove(handle);
        }
        tree.order.retain(|handle| !removed.contains(handle));
        debug!("Detached {} element(s) starting at {}", removed.len(), element);
    }

    pub fn is_attached(&self, element: ElementHandle) -> bool {
        self.tree.read().nodes.contains_key(&element)
    }

    pub fn dispatched_events(&self) -> Vec<(ElementHandle, SyntheticMouseEvent)> {
        self.tree.read().dispatched.iter().copied().collect()
    }

    pub fn clear_dispatched(&self) {
        self.tree.write().dispatched.clear();
    }
}

impl Document for HeadlessDocument {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn document_size(&self) -> (u32, u32) {
        self.document_size
    }

    fn scroll_offset(&self) -> (f64, f64) {
        self.tree.read().scroll
    }

    fn scroll_by(&self, dx: f64, dy: f64) {
        let max_x = (self.document_size.0 - self.viewport.0) as f64;
        let max_y = (self.document_size.1 - self.viewport.1) as f64;
        let mut tree = self.tree.write();
        tree.scroll.0 = (tree.scroll.0 + dx).clamp(0.0, max_x);
        tree.scroll.1 = (tree.scroll.1 + dy).clamp(0.0, max_y);
        debug!("Scrolled to ({:.0}, {:.0})", tree.scroll.0, tree.scroll.1);
    }

    fn body(&self) -> ElementHandle {
        self.body
    }

    fn element_from_point(&self, x: f64, y: f64) -> Option<ElementHandle> {
        let tree = self.tree.read();
        tree.order
            .iter()
            .rev()
            .copied()
            .find(|handle| {
                tree.nodes
                    .get(handle)
                    .map(|node| node.info.style.pointer_events != "none" && node.rect.contains(x, y))
                    .unwrap_or(false)
            })
    }

    fn parent(&self, element: ElementHandle) -> Option<ElementHandle> {
        self.tree.read().nodes.get(&element).and_then(|node| node.parent)
    }

    fn describe(&self, element: ElementHandle) -> Option<ElementInfo> {
        self.tree.read().nodes.get(&element).map(|node| node.info.clone())
    }

    fn dispatch_mouse_event(
        &self,
        element: ElementHandle,
        event: &SyntheticMouseEvent,
    ) -> Result<(), HostError> {
        let mut tree = self.tree.write();
        if !tree.nodes.contains_key(&element) {
            return Err(HostError::Detached(element.0));
        }
        tree.dispatched.push_back((element, *event));
        if tree.dispatched.len() > tree.dispatch_limit {
            tree.dispatched.pop_front();
        }
        Ok(())
    }
}

/// Last rendered state of the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub installed: bool,
    pub cursor: Option<(f64, f64)>,
    pub click_progress: Option<(f64, f64, ProgressIndicator)>,
    pub feed_visible: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            installed: false,
            cursor: None,
            click_progress: None,
            feed_visible: true,
        }
    }
}

/// Overlay that records what it was asked to show
#[derive(Debug)]
pub struct RecordingOverlay {
    state: Mutex<OverlayState>,
    elements: HashMap<OverlayElement, ElementHandle>,
}

impl RecordingOverlay {
    /// Overlay elements get handles far above anything a headless document allocates
    pub fn new() -> Self {
        let elements = OverlayElement::ALL
            .iter()
            .enumerate()
            .map(|(i, element)| (*element, ElementHandle(u64::MAX - i as u64)))
            .collect();
        Self {
            state: Mutex::new(OverlayState::default()),
            elements,
        }
    }

    /// Bind an overlay element to a specific document element
    pub fn with_element(mut self, element: OverlayElement, handle: ElementHandle) -> Self {
        self.elements.insert(element, handle);
        self
    }

    pub fn state(&self) -> OverlayState {
        self.state.lock().clone()
    }
}

impl Default for RecordingOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlaySurface for RecordingOverlay {
    fn install(&self) {
        let mut state = self.state.lock();
        state.installed = true;
        state.feed_visible = true;
    }

    fn remove(&self) {
        let mut state = self.state.lock();
        state.installed = false;
        state.cursor = None;
        state.click_progress = None;
    }

    fn is_installed(&self) -> bool {
        self.state.lock().installed
    }

    fn show_cursor(&self, left: f64, top: f64) {
        self.state.lock().cursor = Some((left, top));
    }

    fn hide_cursor(&self) {
        self.state.lock().cursor = None;
    }

    fn show_click_progress(&self, x: f64, y: f64, indicator: ProgressIndicator) {
        self.state.lock().click_progress = Some((x, y, indicator));
    }

    fn hide_click_progress(&self) {
        self.state.lock().click_progress = None;
    }

    fn set_feed_visible(&self, visible: bool) {
        self.state.lock().feed_visible = visible;
    }

    fn element(&self, element: OverlayElement) -> Option<ElementHandle> {
        self.elements.get(&element).copied()
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    back: AtomicUsize,
    forward: AtomicUsize,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn back_count(&self) -> usize {
        self.back.load(Ordering::Relaxed)
    }

    pub fn forward_count(&self) -> usize {
        self.forward.load(Ordering::Relaxed)
    }
}

impl Navigator for RecordingNavigator {
    fn go_back(&self) {
        info!("Navigating back");
        self.back.fetch_add(1, Ordering::Relaxed);
    }

    fn go_forward(&self) {
        info!("Navigating forward");
        self.forward.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub handle: NotificationHandle,
    pub kind: NotificationKind,
    pub message: String,
    pub closed: bool,
}

/// Notifier that writes to the log and keeps a bounded history
#[derive(Debug)]
pub struct LogNotifier {
    records: Arc<Mutex<VecDeque<NotificationRecord>>>,
    history_limit: usize,
    next_id: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::with_history_limit(NOTIFICATION_HISTORY_LIMIT)
    }

    /// Keep at most `limit` records. Closed notifications are evicted
    /// first, oldest first.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::new())),
            history_limit: limit.max(1),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn history(&self) -> Vec<NotificationRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Notifications still on screen
    pub fn open(&self) -> Vec<NotificationRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| !record.closed)
            .cloned()
            .collect()
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn mark_closed(records: &Mutex<VecDeque<NotificationRecord>>, handle: NotificationHandle) -> bool {
    let mut records = records.lock();
    match records
        .iter_mut()
        .find(|record| record.handle == handle && !record.closed)
    {
        Some(record) => {
            record.closed = true;
            true
        }
        None => false,
    }
}

impl Notifier for LogNotifier {
    fn notify(
        &self,
        kind: NotificationKind,
        message: &str,
        options: NotifyOptions,
    ) -> NotificationHandle {
        let handle = NotificationHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        match kind {
            NotificationKind::Error => error!("[notification] {}", message),
            _ => info!("[notification] {}", message),
        }

        {
            let mut records = self.records.lock();
            records.push_back(NotificationRecord {
                handle,
                kind,
                message: message.to_string(),
                closed: false,
            });
            if records.len() > self.history_limit {
                let evict = records.iter().position(|record| record.closed).unwrap_or(0);
                records.remove(evict);
            }
        }

        if let Some(delay) = options.auto_close {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let records = Arc::clone(&self.records);
                    let on_close = options.on_close;
                    runtime.spawn(async move {
                        tokio::time::sleep(delay).await;
                        // Dismissed notifications do not fire their close callback
                        if mark_closed(&records, handle) {
                            if let Some(callback) = on_close {
                                callback();
                            }
                        }
                    });
                }
                Err(_) => {
                    debug!("No async runtime; notification {:?} will not auto-close", handle);
                }
            }
        }

        handle
    }

    fn dismiss(&self, handle: NotificationHandle) {
        if mark_closed(&self.records, handle) {
            debug!("Dismissed notification {:?}", handle);
        }
    }

    fn container_class(&self) -> Option<String> {
        Some("handnav-notifications".to_string())
    }
}

/// 1x1 transparent PNG
const PLACEHOLDER_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

/// Rasterizer that produces a placeholder image and records each request
#[derive(Debug, Default)]
pub struct BlankRasterizer {
    requests: Mutex<Vec<RasterizeRequest>>,
    fail: bool,
}

impl BlankRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterizer whose every call fails
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<RasterizeRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Rasterizer for BlankRasterizer {
    async fn rasterize(&self, request: RasterizeRequest) -> Result<String, CaptureError> {
        debug!(
            "Rasterizing {}x{} (translate {:?}, {} excluded elements)",
            request.width,
            request.height,
            request.translate,
            request.exclusions.elements.len()
        );
        self.requests.lock().push(request);

        if self.fail {
            return Err(CaptureError::Rasterize {
                details: "rasterizer unavailable".to_string(),
            });
        }
        Ok(format!("data:image/png;base64,{}", PLACEHOLDER_PNG))
    }
}

/// Decode the payload of a base64 `data:` URI
pub fn decode_data_uri(data_uri: &str) -> Result<Vec<u8>, CaptureError> {
    let rest = data_uri
        .strip_prefix("data:")
        .ok_or_else(|| CaptureError::InvalidDataUri {
            details: "missing data: scheme".to_string(),
        })?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CaptureError::InvalidDataUri {
            details: "missing payload separator".to_string(),
        })?;
    if !header.ends_with(";base64") {
        return Err(CaptureError::InvalidDataUri {
            details: format!("unsupported encoding in '{}'", header),
        });
    }

    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| CaptureError::InvalidDataUri {
            details: e.to_string(),
        })
}

/// Writes decoded images into a directory
#[derive(Debug, Clone)]
pub struct FileDownloader {
    directory: PathBuf,
}

impl FileDownloader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }
}

#[async_trait]
impl Downloader for FileDownloader {
    async fn save(&self, data_uri: &str, filename: &str) -> Result<String, CaptureError> {
        let bytes = decode_data_uri(data_uri)?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| CaptureError::DirectoryCreation {
                path: self.directory.display().to_string(),
                source,
            })?;

        let path = self.directory.join(filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| CaptureError::Save {
                filename: filename.to_string(),
                source,
            })?;

        if bytes.is_empty() {
            warn!("Saved empty image to {}", path.display());
        } else {
            info!("Saved {} ({} bytes)", path.display(), bytes.len());
        }
        Ok(path.display().to_string())
    }
}
