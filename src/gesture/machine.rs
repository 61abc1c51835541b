use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

use super::state::{HoldProgress, SessionState};
use super::types::{CaptureKind, GestureAction, GestureKind, NavigationDirection};
use crate::classifier::{classify, mirrored_index_x, scroll_reference_y, GestureClassification};
use crate::config::{CursorConfig, GestureConfig, HandnavConfig};
use crate::host::{Document, ElementHandle, OverlayElement, OverlaySurface};
use crate::interactive::{HeuristicInteractivity, Interactivity};
use crate::landmarks::LandmarkFrame;
use crate::smoothing::{fingertip_to_screen, CursorPosition};

/// Upper bound on the ancestor walk when looking for a clickable element
const MAX_ANCESTOR_DEPTH: usize = 256;

/// Turns classified frames into debounced UI actions.
///
/// Each tick resolves to exactly one branch, checked in priority order:
/// pointer, two fingers, four fingers, palm, fist, then a full reset for
/// anything else. Only one hold timer (fist, palm or click) is ever active.
pub struct GestureStateMachine {
    gestures: GestureConfig,
    cursor: CursorConfig,
    document: Arc<dyn Document>,
    overlay: Arc<dyn OverlaySurface>,
    interactivity: Arc<dyn Interactivity>,
    state: SessionState,
    last_gesture: GestureKind,
}

impl GestureStateMachine {
    pub fn new(
        config: &HandnavConfig,
        document: Arc<dyn Document>,
        overlay: Arc<dyn OverlaySurface>,
    ) -> Self {
        Self {
            gestures: config.gestures.clone(),
            cursor: config.cursor.clone(),
            document,
            overlay,
            interactivity: Arc::new(HeuristicInteractivity::new()),
            state: SessionState::new(&config.gestures, &config.cursor),
            last_gesture: GestureKind::NoHand,
        }
    }

    pub fn with_interactivity(mut self, interactivity: Arc<dyn Interactivity>) -> Self {
        self.interactivity = interactivity;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn last_gesture(&self) -> GestureKind {
        self.last_gesture
    }

    /// Process one tick. `None` means no hand was detected.
    pub fn process(&mut self, frame: Option<&LandmarkFrame>, now: Instant) -> Vec<GestureAction> {
        match frame {
            Some(frame) => {
                let classification = classify(frame);
                self.step(&classification, frame, now)
            }
            None => {
                let mut actions = Vec::new();
                self.full_reset(&mut actions);
                self.record_gesture(GestureKind::NoHand);
                actions
            }
        }
    }

    /// Dispatch one classified frame to the first matching branch
    pub fn step(
        &mut self,
        classification: &GestureClassification,
        frame: &LandmarkFrame,
        now: Instant,
    ) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        trace!("Classification: {:?}", classification);

        let gesture = if classification.index_only() {
            self.state.fist.reset();
            self.state.palm.reset();
            self.vertical_scroll(frame, false, now, &mut actions);
            let position = self.move_cursor(frame, &mut actions);
            self.check_click(position, now, &mut actions);
            GestureKind::Pointer
        } else if classification.two_fingers() {
            self.hide_cursor(&mut actions);
            self.hide_progress(&mut actions);
            self.vertical_scroll(frame, true, now, &mut actions);
            self.reset_click(&mut actions);
            self.state.fist.reset();
            self.state.palm.reset();
            GestureKind::TwoFinger
        } else if classification.four_fingers() {
            self.hide_cursor(&mut actions);
            self.hide_progress(&mut actions);
            self.swipe(frame, now, &mut actions);
            self.reset_click(&mut actions);
            self.state.fist.reset();
            self.state.palm.reset();
            GestureKind::FourFinger
        } else if classification.open_palm() {
            self.hide_cursor(&mut actions);
            self.reset_click(&mut actions);
            self.state.fist.reset();
            if self.state.palm.advance(now, self.gestures.palm_hold()) == HoldProgress::Fire {
                info!("Palm held for {}ms, capturing full page", self.gestures.palm_hold_ms);
                actions.push(GestureAction::Capture(CaptureKind::FullPage));
            }
            GestureKind::Palm
        } else if classification.is_fist {
            self.hide_cursor(&mut actions);
            self.reset_click(&mut actions);
            self.state.palm.reset();
            if self.state.fist.advance(now, self.gestures.fist_hold()) == HoldProgress::Fire {
                info!("Fist held for {}ms, capturing viewport", self.gestures.fist_hold_ms);
                actions.push(GestureAction::Capture(CaptureKind::Region));
            }
            GestureKind::Fist
        } else {
            self.full_reset(&mut actions);
            GestureKind::Unrecognized
        };

        self.record_gesture(gesture);
        actions
    }

    /// Drop all session state, hiding anything currently shown
    pub fn reset(&mut self) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        self.full_reset(&mut actions);
        self.last_gesture = GestureKind::NoHand;
        actions
    }

    fn record_gesture(&mut self, gesture: GestureKind) {
        if gesture != self.last_gesture {
            debug!("Gesture changed: {} -> {}", self.last_gesture, gesture);
            self.last_gesture = gesture;
        }
    }

    fn vertical_scroll(
        &mut self,
        frame: &LandmarkFrame,
        two_fingers: bool,
        now: Instant,
        actions: &mut Vec<GestureAction>,
    ) {
        let y = scroll_reference_y(frame, two_fingers);
        self.state.vertical.push(y);

        if let Some(last_y) = self.state.last_y {
            if self.state.cooldown_elapsed(now, self.gestures.cooldown()) {
                let delta = y - last_y;
                let threshold = self.gestures.scroll_threshold;
                let scroll = if two_fingers && delta < -threshold {
                    Some(self.gestures.scroll_amount)
                } else if !two_fingers && delta > threshold {
                    Some(-self.gestures.scroll_amount)
                } else {
                    None
                };

                if let Some(delta_y) = scroll {
                    debug!("Scroll by {} (reference moved {:.3})", delta_y, delta);
                    actions.push(GestureAction::Scroll { delta_y });
                    self.state.last_action = Some(now);
                    self.state.vertical.clear();
                    self.reset_click(actions);
                }
            }
        }

        self.state.last_y = Some(y);
    }

    fn swipe(&mut self, frame: &LandmarkFrame, now: Instant, actions: &mut Vec<GestureAction>) {
        let x = mirrored_index_x(frame);
        self.state.horizontal.push(x);

        let Some(previous) = self.state.horizontal.previous() else {
            return;
        };
        if !self.state.cooldown_elapsed(now, self.gestures.cooldown()) {
            return;
        }

        let dx = x - previous;
        if dx.abs() > self.gestures.swipe_threshold {
            let direction = if dx > 0.0 {
                NavigationDirection::Back
            } else {
                NavigationDirection::Forward
            };
            debug!("Swipe {:.3} -> {:?}", dx, direction);
            actions.push(GestureAction::Navigate(direction));
            self.state.last_action = Some(now);
            self.state.horizontal.clear();
        }
    }

    fn move_cursor(&mut self, frame: &LandmarkFrame, actions: &mut Vec<GestureAction>) -> CursorPosition {
        let tip = frame.index_tip();
        let (x, y) = fingertip_to_screen(tip.x, tip.y, self.cursor.sensitivity, self.document.viewport());
        let position = self.state.cursor.push(x, y);
        actions.push(GestureAction::MoveCursor(position));
        self.state.cursor_visible = true;
        position
    }

    fn check_click(&mut self, position: CursorPosition, now: Instant, actions: &mut Vec<GestureAction>) {
        let hit = self
            .document
            .element_from_point(position.x, position.y)
            .filter(|element| !self.is_overlay(*element));
        let Some(hit) = hit else {
            self.reset_click(actions);
            return;
        };
        let Some(candidate) = self.clickable_ancestor(hit) else {
            self.reset_click(actions);
            return;
        };

        let click = &mut self.state.click;
        if click.target != Some(candidate) {
            debug!("Click target is now {}", candidate);
            click.reset();
            click.target = Some(candidate);
        }

        let threshold = self.gestures.click_hold();
        match click.timer.advance(now, threshold) {
            HoldProgress::Started => {
                actions.push(GestureAction::ClickProgress {
                    position,
                    progress: 0.0,
                });
                self.state.progress_visible = true;
            }
            HoldProgress::Holding(elapsed) => {
                let progress = (elapsed.as_secs_f64() / threshold.as_secs_f64()).min(1.0);
                actions.push(GestureAction::ClickProgress { position, progress });
                self.state.progress_visible = true;
            }
            HoldProgress::Fire => {
                info!("Click on {} at ({:.0}, {:.0})", candidate, position.x, position.y);
                actions.push(GestureAction::Click {
                    target: candidate,
                    position,
                });
                actions.push(GestureAction::ClickConfirmed { position });
                click.confirmed_at = Some(now);
                self.state.progress_visible = true;
            }
            HoldProgress::AlreadyFired => {
                // Target and latch stay; only the confirmation flash ends
                if let Some(confirmed_at) = click.confirmed_at {
                    if now.saturating_duration_since(confirmed_at) >= self.gestures.click_confirm() {
                        click.confirmed_at = None;
                        self.hide_progress(actions);
                    }
                }
            }
        }
    }

    fn clickable_ancestor(&self, hit: ElementHandle) -> Option<ElementHandle> {
        let mut current = Some(hit);
        let mut depth = 0;

        while let Some(element) = current {
            if self.document.is_body(element) || depth >= MAX_ANCESTOR_DEPTH {
                break;
            }
            if let Some(info) = self.document.describe(element) {
                if self.interactivity.is_interactive(&info) {
                    return Some(element);
                }
            }
            current = self.document.parent(element);
            depth += 1;
        }

        None
    }

    fn is_overlay(&self, element: ElementHandle) -> bool {
        [OverlayElement::Cursor, OverlayElement::ClickProgress]
            .iter()
            .any(|overlay| self.overlay.element(*overlay) == Some(element))
    }

    fn hide_cursor(&mut self, actions: &mut Vec<GestureAction>) {
        if self.state.cursor_visible {
            actions.push(GestureAction::HideCursor);
            self.state.cursor_visible = false;
        }
    }

    fn hide_progress(&mut self, actions: &mut Vec<GestureAction>) {
        if self.state.progress_visible {
            actions.push(GestureAction::HideClickProgress);
            self.state.progress_visible = false;
        }
    }

    fn reset_click(&mut self, actions: &mut Vec<GestureAction>) {
        self.state.click.reset();
        self.hide_progress(actions);
    }

    fn full_reset(&mut self, actions: &mut Vec<GestureAction>) {
        self.hide_cursor(actions);
        self.hide_progress(actions);
        self.state.reset();
    }
}
