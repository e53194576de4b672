//! Shared application state for axum handlers.

use std::sync::Arc;

use actiflow_app::event_bus::InProcessEventBus;
use actiflow_app::runner::InstanceHandle;

/// Application state shared across all axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Producer side of the running instance's input queue.
    pub instance: InstanceHandle,
    /// Bus the instance publishes its events on, for the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl AppState {
    #[must_use]
    pub fn new(instance: InstanceHandle, event_bus: Arc<InProcessEventBus>) -> Self {
        Self {
            instance,
            event_bus,
        }
    }
}
