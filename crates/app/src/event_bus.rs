//! In-process event bus backed by a tokio broadcast channel.
//!
//! The instance publishes its observability events here; the HTTP adapter
//! turns each subscription into an SSE stream.

use std::future::Future;

use tokio::sync::broadcast;

use actiflow_domain::error::ActiflowError;
use actiflow_domain::event::Event;

use crate::ports::EventPublisher;

/// Fan-out of instance events to any number of live observers.
///
/// Observers only see events published after they subscribed. A slow
/// observer that falls more than `capacity` events behind loses the oldest
/// ones and is told how many on its next receive.
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of live observers.
    #[must_use]
    pub fn observers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ActiflowError>> + Send {
        let event_type = event.event_type;
        let instance_id = event.instance_id;
        // Nobody listening is not a failure; the event is dropped.
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(%instance_id, %event_type, observers = delivered, "event published");
        async { Ok(()) }
    }
}
