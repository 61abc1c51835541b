//! Gesture interpretation: per-frame classification in, ordered UI actions out.

pub mod machine;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use machine::GestureStateMachine;
pub use state::{ClickState, HoldProgress, HoldTimer, SessionState};
pub use types::{CaptureKind, GestureAction, GestureKind, NavigationDirection};
