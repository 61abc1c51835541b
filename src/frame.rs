use std::sync::Arc;
use std::time::SystemTime;

/// One camera frame handed to the landmark detector. The payload is opaque
/// to the pipeline; only the detector interprets it.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Monotonic frame identifier
    pub id: u64,
    /// Capture time
    pub timestamp: SystemTime,
    /// Encoded image data (shared so detectors can hold on to it cheaply)
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl VideoFrame {
    pub fn new(id: u64, timestamp: SystemTime, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
        }
    }

    /// Frame without pixel data
    pub fn empty(id: u64, width: u32, height: u32) -> Self {
        Self::new(id, SystemTime::now(), Vec::new(), width, height)
    }
}
