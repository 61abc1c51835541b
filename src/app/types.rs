/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
    /// The camera stream (or replayed recording) ran out of frames
    StreamEnded,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::Signal(signal) => write!(f, "signal {}", signal),
            ShutdownReason::Error(error) => write!(f, "error: {}", error),
            ShutdownReason::UserRequest => write!(f, "user request"),
            ShutdownReason::StreamEnded => write!(f, "camera stream ended"),
        }
    }
}
