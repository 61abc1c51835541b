//! Frame driver: pulls camera frames, runs landmark detection and feeds the
//! gesture state machine once per display refresh.

pub mod detector;
pub mod frame_loop;
pub mod source;
pub mod stats;

#[cfg(test)]
mod tests;

pub use detector::{LandmarkDetector, ReplayDetector};
pub use frame_loop::{FrameLoop, TickStatus};
pub use source::{FrameSource, SyntheticFrameSource};
pub use stats::LoopStats;
