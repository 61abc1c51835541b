use serde::{Deserialize, Serialize};
use std::fmt;

use crate::host::ElementHandle;
use crate::smoothing::CursorPosition;

/// Which dispatch branch a tick fell into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    NoHand,
    /// Index finger only
    Pointer,
    /// Index and middle fingers
    TwoFinger,
    /// All four fingers, thumb folded
    FourFinger,
    Palm,
    Fist,
    Unrecognized,
}

impl GestureKind {
    pub fn hand_present(&self) -> bool {
        !matches!(self, GestureKind::NoHand)
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GestureKind::NoHand => "no hand",
            GestureKind::Pointer => "pointer",
            GestureKind::TwoFinger => "two fingers",
            GestureKind::FourFinger => "four fingers",
            GestureKind::Palm => "palm",
            GestureKind::Fist => "fist",
            GestureKind::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationDirection {
    Back,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Visible viewport
    Region,
    /// Entire scrollable document
    FullPage,
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKind::Region => f.write_str("region"),
            CaptureKind::FullPage => f.write_str("full page"),
        }
    }
}

/// One side effect decided by the state machine, applied in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum GestureAction {
    /// Place the cursor marker centered on the smoothed position
    MoveCursor(CursorPosition),
    HideCursor,
    ClickProgress {
        position: CursorPosition,
        progress: f64,
    },
    ClickConfirmed {
        position: CursorPosition,
    },
    HideClickProgress,
    /// Scroll the page vertically; positive moves the content down the page
    Scroll {
        delta_y: f64,
    },
    Navigate(NavigationDirection),
    Click {
        target: ElementHandle,
        position: CursorPosition,
    },
    Capture(CaptureKind),
}
