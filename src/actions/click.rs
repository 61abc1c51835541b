use tracing::{debug, warn};

use crate::error::HostError;
use crate::host::{Document, ElementHandle, MouseEventKind, SyntheticMouseEvent};
use crate::smoothing::CursorPosition;

const CLICK_SEQUENCE: [MouseEventKind; 3] = [
    MouseEventKind::MouseDown,
    MouseEventKind::MouseUp,
    MouseEventKind::Click,
];

/// Outcome of dispatching a synthetic click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Dispatched,
    /// The target left the document before the click landed
    TargetGone,
}

/// Dispatch mousedown, mouseup and click on `target` at the cursor position.
///
/// A target that has vanished is not an error. Other dispatch failures stop
/// the sequence and are returned.
pub fn dispatch_click(
    document: &dyn Document,
    target: ElementHandle,
    position: CursorPosition,
) -> Result<ClickOutcome, HostError> {
    for kind in CLICK_SEQUENCE {
        let event = SyntheticMouseEvent::new(kind, position.x, position.y);
        match document.dispatch_mouse_event(target, &event) {
            Ok(()) => {}
            Err(HostError::Detached(_)) => {
                debug!("Click target {} detached before {}", target, kind.name());
                return Ok(ClickOutcome::TargetGone);
            }
            Err(e) => {
                warn!("Dispatching {} on {} failed: {}", kind.name(), target, e);
                return Err(e);
            }
        }
    }
    Ok(ClickOutcome::Dispatched)
}
