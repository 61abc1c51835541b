use std::time::{Duration, Instant};

use crate::config::{CursorConfig, GestureConfig};
use crate::host::ElementHandle;
use crate::smoothing::{BoundedHistory, CursorSmoother};

/// Result of feeding one qualifying frame to a [`HoldTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldProgress {
    /// First qualifying frame; the hold begins now
    Started,
    Holding(Duration),
    /// Threshold reached on this frame
    Fire,
    /// Already fired during this hold
    AlreadyFired,
}

/// Start instant plus a latch so a completed hold fires exactly once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldTimer {
    start: Option<Instant>,
    fired: bool,
}

impl HoldTimer {
    pub fn advance(&mut self, now: Instant, threshold: Duration) -> HoldProgress {
        if self.fired {
            return HoldProgress::AlreadyFired;
        }

        let start = match self.start {
            Some(start) => start,
            None => {
                self.start = Some(now);
                return HoldProgress::Started;
            }
        };

        let elapsed = now.saturating_duration_since(start);
        if elapsed >= threshold {
            self.fired = true;
            HoldProgress::Fire
        } else {
            HoldProgress::Holding(elapsed)
        }
    }

    pub fn reset(&mut self) {
        self.start = None;
        self.fired = false;
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.start
    }
}

/// Hold-to-click bookkeeping for the element under the cursor
#[derive(Debug, Clone, Default)]
pub struct ClickState {
    pub target: Option<ElementHandle>,
    pub timer: HoldTimer,
    /// When the confirmation flash started
    pub confirmed_at: Option<Instant>,
}

impl ClickState {
    pub fn reset(&mut self) {
        self.target = None;
        self.timer.reset();
        self.confirmed_at = None;
    }
}

/// Everything the state machine remembers between frames
#[derive(Debug, Clone)]
pub struct SessionState {
    pub cursor: CursorSmoother,
    pub vertical: BoundedHistory,
    pub horizontal: BoundedHistory,
    /// Last accepted vertical reference
    pub last_y: Option<f64>,
    /// Last scroll or swipe, shared cooldown
    pub last_action: Option<Instant>,
    pub fist: HoldTimer,
    pub palm: HoldTimer,
    pub click: ClickState,
    pub cursor_visible: bool,
    pub progress_visible: bool,
}

impl SessionState {
    pub fn new(gestures: &GestureConfig, cursor: &CursorConfig) -> Self {
        Self {
            cursor: CursorSmoother::new(cursor.smoothing_window),
            vertical: BoundedHistory::new(gestures.history_capacity),
            horizontal: BoundedHistory::new(gestures.history_capacity),
            last_y: None,
            last_action: None,
            fist: HoldTimer::default(),
            palm: HoldTimer::default(),
            click: ClickState::default(),
            cursor_visible: false,
            progress_visible: false,
        }
    }

    /// Clear smoothing, histories, timers and click state. The cooldown
    /// timestamp survives so a reset cannot be used to bypass rate limiting.
    pub fn reset(&mut self) {
        self.cursor.clear();
        self.vertical.clear();
        self.horizontal.clear();
        self.last_y = None;
        self.fist.reset();
        self.palm.reset();
        self.click.reset();
    }

    pub fn cooldown_elapsed(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_action {
            Some(last) => now.saturating_duration_since(last) >= cooldown,
            None => true,
        }
    }

    pub fn active_timers(&self) -> usize {
        [self.fist.is_active(), self.palm.is_active(), self.click.timer.is_active()]
            .iter()
            .filter(|active| **active)
            .count()
    }
}
