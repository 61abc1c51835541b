use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandnavError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl HandnavError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<C: Into<String>, M: Into<String>>(component: C, message: M) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Camera stream acquisition and frame delivery failures
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Camera device unavailable: {details}")]
    Unavailable { details: String },

    #[error("Camera stream not acquired")]
    NotAcquired,

    #[error("Camera stream ended")]
    StreamEnded,

    #[error("Frame read failed: {details}")]
    FrameRead { details: String },
}

impl CameraError {
    /// Transient errors leave the stream usable on the next tick
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CameraError::FrameRead { .. })
    }
}

/// Landmark model failures
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Landmark model failed to load: {details}")]
    ModelLoad { details: String },

    #[error("Landmark detection failed: {details}")]
    Detection { details: String },

    #[error("Malformed landmark data: {details}")]
    Malformed { details: String },
}

impl InferenceError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, InferenceError::ModelLoad { .. })
    }
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Rasterization failed: {details}")]
    Rasterize { details: String },

    #[error("Invalid image data URI: {details}")]
    InvalidDataUri { details: String },

    #[error("Failed to save {filename}: {source}")]
    Save {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create capture directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reported by the host document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Element {0} is no longer attached to the document")]
    Detached(u64),

    #[error("Event dispatch failed: {details}")]
    Dispatch { details: String },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, HandnavError>;
