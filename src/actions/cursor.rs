use crate::host::{OverlaySurface, ProgressIndicator};
use crate::smoothing::CursorPosition;

/// Top-left corner that centers a marker of `marker_size` on `position`
pub fn marker_origin(position: CursorPosition, marker_size: f64) -> (f64, f64) {
    let half = marker_size / 2.0;
    (position.x - half, position.y - half)
}

pub fn place_cursor(overlay: &dyn OverlaySurface, position: CursorPosition, marker_size: f64) {
    let (left, top) = marker_origin(position, marker_size);
    overlay.show_cursor(left, top);
}

pub fn show_progress(overlay: &dyn OverlaySurface, position: CursorPosition, progress: f64) {
    overlay.show_click_progress(
        position.x,
        position.y,
        ProgressIndicator::Filling(progress.clamp(0.0, 1.0)),
    );
}

pub fn show_confirmed(overlay: &dyn OverlaySurface, position: CursorPosition) {
    overlay.show_click_progress(position.x, position.y, ProgressIndicator::Confirmed);
}
