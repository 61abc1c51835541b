use super::{ComponentState, HandnavOrchestrator};
use crate::error::{HandnavError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

const TRACKING_STOP_TIMEOUT: Duration = Duration::from_secs(5);
const CAPTURE_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

impl HandnavOrchestrator {
    /// Perform graceful shutdown: stop the frame loop, then let in-flight
    /// captures finish
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Cancel all background tasks
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        if let Err(e) = self.stop_tracking().await {
            error!("Error stopping tracking: {}", e);
            exit_code = 1;
        }

        if let Err(e) = self.stop_captures().await {
            error!("Error stopping capture: {}", e);
            exit_code = 1;
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_tracking(&mut self) -> Result<()> {
        let component = "tracking";
        let Some(task) = self.loop_task.take() else {
            // Never started, or failed to start
            if let Some(frame_loop) = self.frame_loop.as_mut() {
                frame_loop.stop().await;
            }
            if self.get_component_state(component).await != Some(ComponentState::Failed) {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
            }
            return Ok(());
        };

        let joined = self
            .stop_component(component, TRACKING_STOP_TIMEOUT, async move {
                task.await.map_err(|e| {
                    HandnavError::component("tracking", format!("frame loop task failed: {}", e))
                })
            })
            .await?;

        let (frame_loop, result) = joined;
        self.frame_loop = Some(frame_loop);
        if let Err(e) = result {
            self.set_component_state(component, ComponentState::Failed)
                .await;
            return Err(e);
        }
        Ok(())
    }

    async fn stop_captures(&mut self) -> Result<()> {
        let executor = std::sync::Arc::clone(&self.executor);
        self.stop_component("capture", CAPTURE_DRAIN_TIMEOUT, async move {
            executor.wait_for_captures().await;
            let stats = executor.capture_stats();
            info!(
                "Captures finished: {} saved, {} failed",
                stats.completed, stats.failed
            );
            Ok(())
        })
        .await
    }

    /// Drive a component's stop future under a timeout, tracking its state
    async fn stop_component<T, F>(&self, component: &str, limit: Duration, stop: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        match timeout(limit, stop).await {
            Ok(Ok(value)) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
                Ok(value)
            }
            Ok(Err(e)) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
                Err(e)
            }
            Err(_) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("{} component stop timeout", component);
                Err(HandnavError::system(format!(
                    "{} component stop timeout",
                    component
                )))
            }
        }
    }
}
