use super::orchestrator::{send_shutdown, SharedShutdownSender};
use super::{HandnavOrchestrator, ShutdownReason};
use crate::error::{HandnavError, Result};
use crate::events::HandnavEvent;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::signal;
use tracing::{error, info};

impl HandnavOrchestrator {
    /// Run until a signal arrives or the camera stream ends, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("Handnav is running");

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| HandnavError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers();

        let shutdown_reason = shutdown_receiver
            .await
            .map_err(|_| HandnavError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {}", shutdown_reason);
        let _ = self
            .event_bus
            .publish(HandnavEvent::ShutdownRequested {
                timestamp: SystemTime::now(),
                reason: shutdown_reason.to_string(),
            })
            .await;

        let mut exit_code = self.shutdown().await?;
        if matches!(shutdown_reason, ShutdownReason::Error(_)) {
            exit_code = 1;
        }

        info!("Handnav shutdown complete");
        Ok(exit_code)
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self) {
        // Handle SIGTERM - Unix only
        #[cfg(unix)]
        {
            let sender: SharedShutdownSender = Arc::clone(&self.shutdown_sender);
            let cancel = self.cancellation_token.clone();
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            error!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };
                tokio::select! {
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        send_shutdown(&sender, ShutdownReason::Signal("SIGTERM".to_string())).await;
                    }
                    _ = cancel.cancelled() => {}
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let sender = Arc::clone(&self.shutdown_sender);
        let cancel = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                Ok(()) = signal::ctrl_c() => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    send_shutdown(&sender, ShutdownReason::Signal("SIGINT".to_string())).await;
                }
                _ = cancel.cancelled() => {}
            }
        });
    }
}
