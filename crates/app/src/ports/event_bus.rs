//! Event bus port — publish/subscribe for instance events.

use std::future::Future;

use actiflow_domain::error::ActiflowError;
use actiflow_domain::event::Event;

/// Publishes instance events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ActiflowError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ActiflowError>> + Send {
        (**self).publish(event)
    }
}
