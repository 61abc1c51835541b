use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, info};

use crate::error::InferenceError;
use crate::frame::VideoFrame;
use crate::landmarks::Landmark;

/// Hand landmark model. Takes `&mut self` so calls never overlap.
#[async_trait]
pub trait LandmarkDetector: Send {
    /// Load model weights before the first detection
    async fn load(&mut self) -> Result<(), InferenceError> {
        Ok(())
    }

    /// Landmarks of the first detected hand, or `None` when no hand is visible
    async fn detect(
        &mut self,
        frame: &VideoFrame,
        timestamp_ms: f64,
    ) -> Result<Option<Vec<Landmark>>, InferenceError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordedPoint {
    Triple([f64; 3]),
    Pair([f64; 2]),
    Object(Landmark),
}

impl From<RecordedPoint> for Landmark {
    fn from(point: RecordedPoint) -> Self {
        match point {
            RecordedPoint::Triple(xyz) => Landmark::from(xyz),
            RecordedPoint::Pair([x, y]) => Landmark::new(x, y, 0.0),
            RecordedPoint::Object(landmark) => landmark,
        }
    }
}

/// Plays back landmark frames recorded as JSON lines.
///
/// Each non-empty line is `null` (no hand) or an array of points, each point
/// either `[x, y, z]`, `[x, y]` or `{"x": .., "y": .., "z": ..}`. Once the
/// recording is exhausted every detection reports no hand.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    frames: VecDeque<Option<Vec<Landmark>>>,
    total: usize,
}

impl ReplayDetector {
    pub fn from_frames(frames: Vec<Option<Vec<Landmark>>>) -> Self {
        let total = frames.len();
        Self {
            frames: frames.into(),
            total,
        }
    }

    pub fn from_jsonl_str(content: &str) -> Result<Self, InferenceError> {
        let mut frames = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let points: Option<Vec<RecordedPoint>> =
                serde_json::from_str(line).map_err(|e| InferenceError::Malformed {
                    details: format!("line {}: {}", line_number + 1, e),
                })?;
            frames.push(points.map(|points| points.into_iter().map(Landmark::from).collect()));
        }
        Ok(Self::from_frames(frames))
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| InferenceError::ModelLoad {
                    details: format!("cannot read {}: {}", path.display(), e),
                })?;
        let detector = Self::from_jsonl_str(&content)?;
        info!(
            "Loaded {} recorded landmark frames from {}",
            detector.total,
            path.display()
        );
        Ok(detector)
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl LandmarkDetector for ReplayDetector {
    async fn detect(
        &mut self,
        frame: &VideoFrame,
        timestamp_ms: f64,
    ) -> Result<Option<Vec<Landmark>>, InferenceError> {
        let landmarks = self.frames.pop_front().flatten();
        debug!(
            "Replay frame {} at {:.1}ms: {}",
            frame.id,
            timestamp_ms,
            landmarks
                .as_ref()
                .map(|points| format!("{} landmarks", points.len()))
                .unwrap_or_else(|| "no hand".to_string())
        );
        Ok(landmarks)
    }
}
