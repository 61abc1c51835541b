use async_trait::async_trait;
use tracing::{debug, info, trace};

use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::frame::VideoFrame;

/// Camera stream feeding the frame loop. Owned exclusively by the driver.
#[async_trait]
pub trait FrameSource: Send {
    async fn acquire(&mut self) -> Result<(), CameraError>;

    async fn next_frame(&mut self) -> Result<VideoFrame, CameraError>;

    /// Stop the stream. Safe to call when not acquired.
    async fn release(&mut self);

    fn is_acquired(&self) -> bool;
}

/// Emits empty frames at the configured resolution, for running without a
/// camera
pub struct SyntheticFrameSource {
    config: CameraConfig,
    frame_counter: u64,
    frame_limit: Option<u64>,
    acquired: bool,
    deny_access: bool,
}

impl SyntheticFrameSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_counter: 0,
            frame_limit: None,
            acquired: false,
            deny_access: false,
        }
    }

    /// End the stream after `limit` frames
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Source whose acquisition always fails with a permission error
    pub fn denied(config: CameraConfig) -> Self {
        Self {
            deny_access: true,
            ..Self::new(config)
        }
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frame_counter
    }
}

#[async_trait]
impl FrameSource for SyntheticFrameSource {
    async fn acquire(&mut self) -> Result<(), CameraError> {
        if self.deny_access {
            return Err(CameraError::PermissionDenied);
        }
        if self.acquired {
            debug!("Synthetic camera already acquired");
            return Ok(());
        }

        info!(
            "Synthetic camera started ({}x{} @ {}fps)",
            self.config.resolution.0, self.config.resolution.1, self.config.fps
        );
        self.acquired = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if !self.acquired {
            return Err(CameraError::NotAcquired);
        }
        if let Some(limit) = self.frame_limit {
            if self.frame_counter >= limit {
                return Err(CameraError::StreamEnded);
            }
        }

        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        let (width, height) = self.config.resolution;
        trace!("Generated synthetic frame {} ({}x{})", frame_id, width, height);
        Ok(VideoFrame::empty(frame_id, width, height))
    }

    async fn release(&mut self) {
        if self.acquired {
            info!("Synthetic camera stopped after {} frames", self.frame_counter);
        }
        self.acquired = false;
    }

    fn is_acquired(&self) -> bool {
        self.acquired
    }
}
