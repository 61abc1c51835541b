use super::{ComponentState, HandnavOrchestrator};
use crate::driver::LoopStats;
use std::collections::HashMap;
use tracing::debug;

impl HandnavOrchestrator {
    /// Update component state
    pub async fn set_component_state(&self, component: &str, state: ComponentState) {
        let mut states = self.component_states.lock().await;
        states.insert(component.to_string(), state.clone());
        debug!("Component '{}' state changed to: {:?}", component, state);
    }

    /// Get component state
    pub async fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        let states = self.component_states.lock().await;
        states.get(component).cloned()
    }

    /// Get all component states
    pub async fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        let states = self.component_states.lock().await;
        states.clone()
    }

    /// Whether gesture tracking came up. When false the page keeps working
    /// without gestures.
    pub fn is_tracking_available(&self) -> bool {
        self.tracking_available
    }

    /// Frame loop statistics, available while the loop is not running
    pub fn loop_stats(&self) -> Option<LoopStats> {
        self.frame_loop.as_ref().map(|frame_loop| frame_loop.stats().clone())
    }
}
