use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::error::{HandnavError, Result};
use crate::gesture::CaptureKind;

/// Sidecar describing a saved capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub capture_id: String,
    pub kind: CaptureKind,
    pub filename: String,
    pub location: String,
    pub width: u32,
    pub height: u32,
    pub scroll_offset: (f64, f64),
    pub captured_at: DateTime<Utc>,
}

/// Counters for the capture pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub in_flight: usize,
    pub completed: u64,
    pub failed: u64,
}

pub(crate) async fn save_metadata(metadata: &CaptureMetadata, capture_path: &str) -> Result<PathBuf> {
    let metadata_json = serde_json::to_string_pretty(metadata).map_err(|e| {
        HandnavError::component("capture", format!("Failed to serialize metadata: {}", e))
    })?;

    let metadata_dir = PathBuf::from(capture_path).join("metadata");
    fs::create_dir_all(&metadata_dir).await.map_err(|e| {
        HandnavError::component(
            "capture",
            format!("Failed to create metadata directory: {}", e),
        )
    })?;

    let metadata_path = metadata_dir.join(format!("{}.json", metadata.capture_id));
    fs::write(&metadata_path, metadata_json).await.map_err(|e| {
        HandnavError::component("capture", format!("Failed to write metadata file: {}", e))
    })?;

    debug!("Saved metadata to {}", metadata_path.display());
    Ok(metadata_path)
}
