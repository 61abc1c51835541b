use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::metadata::{save_metadata, CaptureMetadata};
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::events::{EventBus, HandnavEvent};
use crate::gesture::CaptureKind;
use crate::host::{
    CaptureExclusions, HostServices, NotificationKind, Notifier, NotifyOptions, OverlayElement,
    OverlaySurface, RasterizeRequest,
};

const EXCLUDED_TAGS: [&str; 4] = ["VIDEO", "CANVAS", "SCRIPT", "STYLE"];
const RESULT_NOTIFICATION: Duration = Duration::from_secs(5);

impl CaptureKind {
    fn filename_prefix(&self) -> &'static str {
        match self {
            CaptureKind::Region => "screenshot",
            CaptureKind::FullPage => "fullpage-screenshot",
        }
    }

    pub fn pending_message(&self) -> &'static str {
        match self {
            CaptureKind::Region => "Taking screenshot...",
            CaptureKind::FullPage => "Taking full page screenshot...",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            CaptureKind::Region => "Screenshot saved successfully!",
            CaptureKind::FullPage => "Full page screenshot saved successfully!",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            CaptureKind::Region => "Screenshot failed. Please try again.",
            CaptureKind::FullPage => "Full page screenshot failed. Please try again.",
        }
    }
}

/// `screenshot-2024-05-01T10-20-30-123Z.png` style name for a capture taken at `at`
pub fn capture_filename(kind: CaptureKind, at: DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}-{}.png", kind.filename_prefix(), timestamp)
}

/// Overlay elements, non-content tags and the notification container
pub fn capture_exclusions(overlay: &dyn OverlaySurface, notifier: &dyn Notifier) -> CaptureExclusions {
    CaptureExclusions {
        elements: OverlayElement::ALL
            .iter()
            .filter_map(|element| overlay.element(*element))
            .collect(),
        tags: EXCLUDED_TAGS.iter().map(|tag| tag.to_string()).collect(),
        classes: notifier.container_class().into_iter().collect(),
    }
}

/// One region or full-page capture, run on its own task
pub(crate) struct CaptureJob {
    pub capture_id: String,
    pub kind: CaptureKind,
    pub config: CaptureConfig,
    pub host: HostServices,
    pub event_bus: Arc<EventBus>,
}

impl CaptureJob {
    /// Run the capture protocol. Never fails: errors restore the overlay and
    /// are reported to the user and on the event bus.
    pub async fn run(self) -> bool {
        let notifier = &self.host.notifier;
        let overlay = &self.host.overlay;

        let pending = notifier.notify(
            NotificationKind::Info,
            self.kind.pending_message(),
            NotifyOptions::persistent(),
        );
        let _ = self
            .event_bus
            .publish(HandnavEvent::CaptureStarted {
                capture_id: self.capture_id.clone(),
                kind: self.kind,
            })
            .await;

        overlay.set_feed_visible(false);
        overlay.hide_cursor();
        overlay.hide_click_progress();

        sleep(Duration::from_millis(self.config.settle_ms)).await;

        let result = self.render_and_save().await;

        // Tracking may have been torn down while rendering
        if overlay.is_installed() {
            overlay.set_feed_visible(true);
        } else {
            debug!("Overlay removed during capture, leaving feed hidden");
        }
        notifier.dismiss(pending);

        match result {
            Ok(metadata) => {
                info!("{} capture saved as {}", self.kind, metadata.filename);
                notifier.notify(
                    NotificationKind::Success,
                    self.kind.success_message(),
                    NotifyOptions::auto_close(RESULT_NOTIFICATION),
                );

                if self.config.save_metadata {
                    if let Err(e) = save_metadata(&metadata, &self.config.path).await {
                        warn!("Failed to save capture metadata: {}", e);
                    }
                }

                let _ = self
                    .event_bus
                    .publish(HandnavEvent::CaptureCompleted {
                        capture_id: self.capture_id.clone(),
                        kind: self.kind,
                        filename: metadata.filename,
                    })
                    .await;
                true
            }
            Err(e) => {
                error!("{} capture failed: {}", self.kind, e);
                notifier.notify(
                    NotificationKind::Error,
                    self.kind.failure_message(),
                    NotifyOptions::auto_close(RESULT_NOTIFICATION),
                );
                let _ = self
                    .event_bus
                    .publish(HandnavEvent::CaptureFailed {
                        capture_id: self.capture_id.clone(),
                        kind: self.kind,
                        error: e.to_string(),
                    })
                    .await;
                false
            }
        }
    }

    async fn render_and_save(&self) -> Result<CaptureMetadata, CaptureError> {
        let document = &self.host.document;
        let scroll_offset = document.scroll_offset();

        let ((width, height), translate) = match self.kind {
            CaptureKind::Region => (
                document.viewport(),
                Some((-scroll_offset.0, -scroll_offset.1)),
            ),
            CaptureKind::FullPage => (document.document_size(), None),
        };

        let request = RasterizeRequest {
            root: document.body(),
            width,
            height,
            background_color: self.config.background_color.clone(),
            scale: self.config.scale,
            translate,
            exclusions: capture_exclusions(self.host.overlay.as_ref(), self.host.notifier.as_ref()),
        };

        let data_uri = self.host.rasterizer.rasterize(request).await?;

        let captured_at = Utc::now();
        let filename = capture_filename(self.kind, captured_at);
        let location = self.host.downloader.save(&data_uri, &filename).await?;

        Ok(CaptureMetadata {
            capture_id: self.capture_id.clone(),
            kind: self.kind,
            filename,
            location,
            width,
            height,
            scroll_offset,
            captured_at,
        })
    }
}
