mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::HandnavOrchestrator;
pub use startup::{help_text, HELP_LINES, LOADING_MESSAGE, READY_MESSAGE};
pub use types::{ComponentState, ShutdownReason};
