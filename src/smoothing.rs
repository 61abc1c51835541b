//! Bounded sample histories used to damp per-frame jitter.

use std::collections::VecDeque;
use tracing::trace;

/// Fixed-capacity FIFO history. Pushing past capacity evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl BoundedHistory {
    /// Create an empty history holding at most `capacity` samples
    ///
    /// # Example
    /// ```
    /// use handnav::smoothing::BoundedHistory;
    ///
    /// let mut history = BoundedHistory::new(2);
    /// history.push(1.0);
    /// history.push(2.0);
    /// history.push(3.0);
    /// assert_eq!(history.len(), 2);
    /// assert_eq!(history.mean(), Some(2.5));
    /// ```
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            panic!("History capacity must be greater than 0");
        }

        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// The sample pushed just before the latest one
    pub fn previous(&self) -> Option<f64> {
        let len = self.samples.len();
        if len > 1 {
            self.samples.get(len - 2).copied()
        } else {
            None
        }
    }

    /// Arithmetic mean of the retained samples
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }
}

/// Screen-space cursor position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

/// Simple moving average over the last N cursor samples
#[derive(Debug, Clone)]
pub struct CursorSmoother {
    x: BoundedHistory,
    y: BoundedHistory,
}

impl CursorSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            x: BoundedHistory::new(window),
            y: BoundedHistory::new(window),
        }
    }

    /// Append a raw sample and return the smoothed position
    pub fn push(&mut self, x: f64, y: f64) -> CursorPosition {
        self.x.push(x);
        self.y.push(y);
        let smoothed = CursorPosition {
            x: self.x.mean().unwrap_or(x),
            y: self.y.mean().unwrap_or(y),
        };
        trace!(
            "Cursor sample ({:.1}, {:.1}) -> ({:.1}, {:.1})",
            x,
            y,
            smoothed.x,
            smoothed.y
        );
        smoothed
    }

    /// Current smoothed position, if any sample has been seen
    pub fn position(&self) -> Option<CursorPosition> {
        Some(CursorPosition {
            x: self.x.mean()?,
            y: self.y.mean()?,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
    }
}

/// Map a normalized fingertip position to viewport pixels.
///
/// The x axis is mirrored so the cursor follows the user's hand, offsets from
/// the frame center are amplified by `sensitivity`, and the result is clamped
/// to the viewport.
pub fn fingertip_to_screen(
    tip_x: f64,
    tip_y: f64,
    sensitivity: f64,
    viewport: (u32, u32),
) -> (f64, f64) {
    const CENTER: f64 = 0.5;
    let (width, height) = (viewport.0 as f64, viewport.1 as f64);

    let nx = 1.0 - tip_x;
    let ny = tip_y;
    let sx = (CENTER + (nx - CENTER) * sensitivity) * width;
    let sy = (CENTER + (ny - CENTER) * sensitivity) * height;

    (
        sx.min(width - 1.0).max(0.0),
        sy.min(height - 1.0).max(0.0),
    )
}
