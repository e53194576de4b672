//! Instance runner — the per-instance single-consumer input queue.
//!
//! [`spawn`] moves an [`Instance`] into its own tokio task. Readings, remote
//! events and registrations may come from any number of producers through
//! cloned [`InstanceHandle`]s; the task applies them one at a time, in
//! arrival order. The latest settled state is published on a `watch`
//! channel.

use tokio::sync::{mpsc, watch};

use actiflow_domain::error::ActiflowError;
use actiflow_domain::graph::CancellationWait;
use actiflow_domain::id::{CapabilityName, InstanceId};
use actiflow_domain::instance::InstanceState;
use actiflow_domain::remote::EventKey;

use crate::executor::{Instance, InstanceInput};
use crate::ports::{Actuator, EventPublisher, RemoteChannel, Sensor};

/// Default number of inputs buffered before producers wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Cloneable producer side of an instance's input queue.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    id: InstanceId,
    sender: mpsc::Sender<InstanceInput>,
    state: watch::Receiver<InstanceState>,
}

impl InstanceHandle {
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Last state the instance settled in after processing an input.
    #[must_use]
    pub fn state(&self) -> InstanceState {
        self.state.borrow().clone()
    }

    /// Enqueue an input.
    ///
    /// # Errors
    ///
    /// Returns [`ActiflowError::InstanceClosed`] once the instance task has
    /// stopped.
    pub async fn send(&self, input: InstanceInput) -> Result<(), ActiflowError> {
        self.sender
            .send(input)
            .await
            .map_err(|_| ActiflowError::InstanceClosed)
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn start(&self) -> Result<(), ActiflowError> {
        self.send(InstanceInput::Start).await
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn deliver_reading(
        &self,
        sensor: impl Into<CapabilityName>,
        value: f64,
    ) -> Result<(), ActiflowError> {
        self.send(InstanceInput::Reading {
            sensor: sensor.into(),
            value,
        })
        .await
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn deliver_event(&self, key: EventKey) -> Result<(), ActiflowError> {
        self.send(InstanceInput::Event(key)).await
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn register_handler(&self, wait: CancellationWait) -> Result<(), ActiflowError> {
        self.send(InstanceInput::RegisterHandler(wait)).await
    }

    /// Wait until the settled state satisfies `predicate`, returning that state.
    ///
    /// # Errors
    ///
    /// Returns [`ActiflowError::InstanceClosed`] if the instance stopped
    /// without ever reaching such a state.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&InstanceState) -> bool,
    ) -> Result<InstanceState, ActiflowError> {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(predicate)
            .await
            .map_err(|_| ActiflowError::InstanceClosed)?
            .clone();
        Ok(settled)
    }

    /// Wait for `Terminal` or `Faulted`.
    ///
    /// # Errors
    ///
    /// Returns [`ActiflowError::InstanceClosed`] if every producer was dropped
    /// before the instance finished.
    pub async fn wait_until_finished(&self) -> Result<InstanceState, ActiflowError> {
        self.wait_for(InstanceState::is_finished).await
    }

    /// Resolves once the instance task has stopped accepting input.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }
}

/// Move `instance` into its own task and return the handle feeding it.
///
/// The task stops when the instance finishes or when every handle is
/// dropped, whichever comes first.
pub fn spawn<S, A, R, P>(mut instance: Instance<S, A, R, P>, capacity: usize) -> InstanceHandle
where
    S: Sensor + 'static,
    A: Actuator + 'static,
    R: RemoteChannel + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = instance.id();
    let (sender, mut receiver) = mpsc::channel(capacity.max(1));
    let (state_tx, state_rx) = watch::channel(instance.state().clone());

    tokio::spawn(async move {
        while let Some(input) = receiver.recv().await {
            let outcome = instance.handle(input).await;
            tracing::trace!(instance_id = %id, ?outcome, state = %instance.state(), "input processed");
            state_tx.send_replace(instance.state().clone());
            if instance.state().is_finished() {
                break;
            }
        }
        tracing::info!(instance_id = %id, state = %instance.state(), "instance runner stopped");
    });

    InstanceHandle {
        id,
        sender,
        state: state_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use actiflow_domain::capability::CapabilityKind;
    use actiflow_domain::comparison::Comparison;
    use actiflow_domain::error::{DeviceError, UnknownCapabilityError};
    use actiflow_domain::event::Event;
    use actiflow_domain::graph::{Activity, ActivityGraph};
    use actiflow_domain::remote::{Method, RemoteRequest};

    use crate::ports::HandleRegistry;
    use crate::sampling::Sampler;

    #[derive(Clone, Default)]
    struct Led(Arc<Mutex<Vec<f64>>>);

    impl Actuator for Led {
        fn write(&self, value: f64) -> impl Future<Output = Result<(), DeviceError>> + Send {
            self.0.lock().unwrap().push(value);
            async { Ok(()) }
        }
    }

    #[derive(Clone)]
    struct Dark;

    impl Sensor for Dark {
        async fn read(&self) -> Result<f64, DeviceError> {
            Ok(0.0)
        }
    }

    struct Board {
        led: Led,
    }

    impl HandleRegistry for Board {
        type Sensor = Dark;
        type Actuator = Led;

        fn sensor(&self, name: &CapabilityName) -> Result<Dark, UnknownCapabilityError> {
            if name.as_str() == "brightness" {
                Ok(Dark)
            } else {
                Err(UnknownCapabilityError {
                    name: name.clone(),
                    kind: CapabilityKind::Sensor,
                })
            }
        }

        fn actuator(&self, name: &CapabilityName) -> Result<Led, UnknownCapabilityError> {
            if name.as_str() == "led" {
                Ok(self.led.clone())
            } else {
                Err(UnknownCapabilityError {
                    name: name.clone(),
                    kind: CapabilityKind::Actuator,
                })
            }
        }
    }

    struct NullRemote;

    impl RemoteChannel for NullRemote {
        async fn send(&self, _request: RemoteRequest) {}
    }

    struct NullPublisher;

    impl EventPublisher for NullPublisher {
        async fn publish(&self, _event: Event) -> Result<(), ActiflowError> {
            Ok(())
        }
    }

    fn spawn_light_switch(led: &Led) -> InstanceHandle {
        let graph = ActivityGraph::builder()
            .name("light switch")
            .activity(Activity::new("start").write("led", 0.0).await_threshold(
                "brightness",
                Comparison::Lt,
                900.0,
                "on",
            ))
            .activity(
                Activity::new("on")
                    .write("led", 1.0)
                    .await_event("off", Method::Put, "off"),
            )
            .activity(Activity::new("off").write("led", 0.0))
            .build()
            .unwrap();
        let instance = Instance::new(
            graph,
            &Board { led: led.clone() },
            NullRemote,
            NullPublisher,
            Sampler::new(Duration::from_millis(10)),
        )
        .unwrap();
        spawn(instance, DEFAULT_QUEUE_CAPACITY)
    }

    #[tokio::test]
    async fn should_process_inputs_in_arrival_order() {
        let led = Led::default();
        let handle = spawn_light_switch(&led);

        handle.start().await.unwrap();
        handle.deliver_reading("brightness", 850.0).await.unwrap();
        handle
            .deliver_event(EventKey::new("off", Method::Put))
            .await
            .unwrap();

        let finished = handle.wait_until_finished().await.unwrap();
        assert_eq!(finished, InstanceState::Terminal);
        assert_eq!(*led.0.lock().unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn should_expose_settled_state_through_handle() {
        let led = Led::default();
        let handle = spawn_light_switch(&led);
        assert_eq!(handle.state(), InstanceState::Idle);

        handle.start().await.unwrap();
        let state = handle
            .wait_for(|s| matches!(s, InstanceState::SuspendedOnThreshold(_)))
            .await
            .unwrap();
        assert!(matches!(state, InstanceState::SuspendedOnThreshold(w) if w.sensor.as_str() == "brightness"));
    }

    #[tokio::test]
    async fn should_reject_inputs_after_instance_finished() {
        let led = Led::default();
        let handle = spawn_light_switch(&led);
        let producer = handle.clone();

        handle.start().await.unwrap();
        handle.deliver_reading("brightness", 850.0).await.unwrap();
        handle
            .deliver_event(EventKey::new("off", Method::Put))
            .await
            .unwrap();
        handle.wait_until_finished().await.unwrap();
        producer.closed().await;

        let result = producer.deliver_reading("brightness", 10.0).await;
        assert!(matches!(result, Err(ActiflowError::InstanceClosed)));
    }

    #[tokio::test]
    async fn should_report_closed_when_waiting_on_unreachable_state() {
        let led = Led::default();
        let handle = spawn_light_switch(&led);

        handle.start().await.unwrap();
        handle.deliver_reading("brightness", 850.0).await.unwrap();
        handle
            .deliver_event(EventKey::new("off", Method::Put))
            .await
            .unwrap();
        handle.wait_until_finished().await.unwrap();

        let result = handle.wait_for(|s| *s == InstanceState::Idle).await;
        assert!(matches!(result, Err(ActiflowError::InstanceClosed)));
    }
}
