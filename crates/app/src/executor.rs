//! Activity graph executor — drives one automation instance.
//!
//! An [`Instance`] owns its resolved capability handles, its current
//! [`InstanceState`], the single cancellation [`HandlerSlot`] and the most
//! recent [`SampleResult`]. Inputs (start, readings, remote events, handler
//! registrations) are processed one at a time through `&mut self`; each
//! input runs a continuation chain to completion or to its next suspension
//! point before returning.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actiflow_domain::error::{ActiflowError, UnknownCapabilityError};
use actiflow_domain::event::{Event, EventType};
use actiflow_domain::graph::{
    Activity, ActivityGraph, CancellationWait, Exit, Resume, Step, ThresholdWatch,
};
use actiflow_domain::id::{ActivityId, CapabilityName, InstanceId};
use actiflow_domain::instance::{Fault, FaultKind, InstanceState};
use actiflow_domain::remote::EventKey;
use actiflow_domain::sample::SampleResult;

use crate::handler_slot::HandlerSlot;
use crate::ports::{Actuator, EventPublisher, HandleRegistry, RemoteChannel, Sensor};
use crate::sampling::Sampler;

/// Default bound on a single remote send before the chain moves on.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// An input an instance reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceInput {
    Start,
    Reading { sensor: CapabilityName, value: f64 },
    Event(EventKey),
    RegisterHandler(CancellationWait),
}

/// What an input did to the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The entry chain ran.
    Started,
    /// An armed watch or wait fired and its continuation ran.
    Fired,
    /// The cancellation registration was replaced.
    Replaced,
    /// Nothing matched; the instance is unchanged.
    Ignored,
}

/// The watch or wait whose firing started the chain currently running.
#[derive(Debug, Clone)]
enum Origin {
    Watch(ThresholdWatch),
    Wait(CancellationWait),
}

/// One running execution of an activity graph.
pub struct Instance<S, A, R, P> {
    id: InstanceId,
    graph: Arc<ActivityGraph>,
    sensors: HashMap<CapabilityName, S>,
    actuators: HashMap<CapabilityName, A>,
    remote: R,
    publisher: P,
    sampler: Sampler,
    send_timeout: Duration,
    state: InstanceState,
    handler: HandlerSlot,
    origin: Option<Origin>,
    last_sample: Option<SampleResult>,
}

impl<S, A, R, P> Instance<S, A, R, P>
where
    S: Sensor,
    A: Actuator,
    R: RemoteChannel,
    P: EventPublisher,
{
    /// Validate `graph` and resolve every capability it references.
    ///
    /// Nothing is read or written here; the instance starts [`Idle`](InstanceState::Idle).
    ///
    /// # Errors
    ///
    /// Returns [`ActiflowError::Validation`] for an invalid graph and
    /// [`ActiflowError::UnknownCapability`] for the first name the registry
    /// cannot resolve.
    pub fn new<H>(
        graph: ActivityGraph,
        registry: &H,
        remote: R,
        publisher: P,
        sampler: Sampler,
    ) -> Result<Self, ActiflowError>
    where
        H: HandleRegistry<Sensor = S, Actuator = A>,
    {
        graph.validate()?;

        let sensors = graph
            .referenced_sensors()
            .into_iter()
            .map(|name| registry.sensor(name).map(|handle| (name.clone(), handle)))
            .collect::<Result<HashMap<_, _>, UnknownCapabilityError>>()?;
        let actuators = graph
            .referenced_actuators()
            .into_iter()
            .map(|name| registry.actuator(name).map(|handle| (name.clone(), handle)))
            .collect::<Result<HashMap<_, _>, UnknownCapabilityError>>()?;

        let id = InstanceId::new();
        tracing::info!(
            instance_id = %id,
            graph = %graph.name,
            sensors = sensors.len(),
            actuators = actuators.len(),
            "automation instance created"
        );

        Ok(Self {
            id,
            graph: Arc::new(graph),
            sensors,
            actuators,
            remote,
            publisher,
            sampler,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            state: InstanceState::Idle,
            handler: HandlerSlot::new(),
            origin: None,
            last_sample: None,
        })
    }

    /// Bound each remote send; a transport still busy after `timeout` is
    /// abandoned and the chain continues.
    #[must_use]
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    #[must_use]
    pub fn graph(&self) -> &ActivityGraph {
        &self.graph
    }

    /// Most recent sample taken by any activity of this instance.
    #[must_use]
    pub fn last_sample(&self) -> Option<&SampleResult> {
        self.last_sample.as_ref()
    }

    /// Dispatch one input to the matching operation.
    pub async fn handle(&mut self, input: InstanceInput) -> Outcome {
        match input {
            InstanceInput::Start => self.start().await,
            InstanceInput::Reading { sensor, value } => self.deliver_reading(&sensor, value).await,
            InstanceInput::Event(key) => self.deliver_event(&key).await,
            InstanceInput::RegisterHandler(wait) => self.register_handler(wait).await,
        }
    }

    /// Run the entry activity. Only an idle instance can start.
    pub async fn start(&mut self) -> Outcome {
        if self.state != InstanceState::Idle {
            tracing::debug!(instance_id = %self.id, state = %self.state, "start ignored");
            return Outcome::Ignored;
        }
        tracing::info!(instance_id = %self.id, graph = %self.graph.name, "starting instance");
        self.origin = None;
        let entry = self.graph.entry.clone();
        self.run_chain(entry).await;
        Outcome::Started
    }

    /// Offer a sensor reading to the armed threshold watch.
    ///
    /// The comparison is evaluated against this reading only. If it holds,
    /// the watch is disarmed before its continuation runs.
    pub async fn deliver_reading(&mut self, sensor: &CapabilityName, value: f64) -> Outcome {
        let InstanceState::SuspendedOnThreshold(watch) = &self.state else {
            return Outcome::Ignored;
        };
        if !watch.fires_on(sensor, value) {
            tracing::trace!(instance_id = %self.id, %sensor, value, "reading does not cross threshold");
            return Outcome::Ignored;
        }
        let watch = watch.clone();

        tracing::info!(
            instance_id = %self.id,
            %sensor,
            value,
            watch = %watch,
            "threshold watch fired"
        );
        self.publish(
            EventType::WatchFired,
            serde_json::json!({
                "sensor": sensor,
                "reading": value,
                "comparison": watch.comparison,
                "threshold": watch.threshold,
                "continuation": &watch.continuation,
            }),
        )
        .await;

        let continuation = watch.continuation.clone();
        self.origin = Some(Origin::Watch(watch));
        self.run_chain(continuation).await;
        Outcome::Fired
    }

    /// Offer a remote event to the cancellation wait.
    ///
    /// The registration is consumed the first time a matching event arrives.
    pub async fn deliver_event(&mut self, key: &EventKey) -> Outcome {
        if !matches!(self.state, InstanceState::SuspendedOnCancel(_)) {
            tracing::debug!(instance_id = %self.id, event = %key, state = %self.state, "event ignored");
            return Outcome::Ignored;
        }
        let Some(registration) = self.handler.take_matching(key) else {
            tracing::debug!(instance_id = %self.id, event = %key, "event does not match registration");
            return Outcome::Ignored;
        };

        tracing::info!(
            instance_id = %self.id,
            event = %key,
            registration = %registration.id,
            "cancellation wait fired"
        );
        self.publish(
            EventType::WaitFired,
            serde_json::json!({
                "event": &key.name,
                "method": key.method,
                "registration": registration.id,
                "continuation": &registration.wait.continuation,
            }),
        )
        .await;

        let continuation = registration.wait.continuation.clone();
        self.origin = Some(Origin::Wait(registration.wait));
        self.run_chain(continuation).await;
        Outcome::Fired
    }

    /// Replace the pending cancellation wait from outside the graph.
    ///
    /// Honored only while the instance is suspended on a wait; the previous
    /// registration is abandoned and its continuation will never run.
    pub async fn register_handler(&mut self, wait: CancellationWait) -> Outcome {
        if !matches!(self.state, InstanceState::SuspendedOnCancel(_)) {
            tracing::debug!(instance_id = %self.id, wait = %wait, state = %self.state, "registration ignored");
            return Outcome::Ignored;
        }
        if self.graph.activity(&wait.continuation).is_none() {
            tracing::warn!(
                instance_id = %self.id,
                continuation = %wait.continuation,
                "registration ignored, continuation is not defined in the graph"
            );
            return Outcome::Ignored;
        }
        self.arm_wait(wait).await;
        Outcome::Replaced
    }

    /// Run activities from `current` until the chain suspends or ends.
    async fn run_chain(&mut self, mut current: ActivityId) {
        let graph = Arc::clone(&self.graph);
        loop {
            self.set_state(InstanceState::Running(current.clone())).await;

            let Some(activity) = graph.activity(&current) else {
                let fault = Fault {
                    kind: FaultKind::UndefinedActivity,
                    activity: current,
                    capability: None,
                    message: "activity is not defined in the graph".to_string(),
                };
                self.fault(fault).await;
                return;
            };

            if let Err(fault) = self.run_steps(activity).await {
                self.fault(fault).await;
                return;
            }

            match &activity.exit {
                Exit::Next { activity } => current = activity.clone(),
                Exit::Branch(edge) => {
                    let next = edge.select(self.last_sample.as_ref()).clone();
                    tracing::debug!(
                        instance_id = %self.id,
                        predicate = %edge.predicate,
                        next = %next,
                        "branch selected"
                    );
                    current = next;
                }
                Exit::AwaitThreshold(watch) => {
                    self.arm_watch(watch.clone()).await;
                    return;
                }
                Exit::AwaitEvent(wait) => {
                    self.arm_wait(wait.clone()).await;
                    return;
                }
                Exit::End { resume } => {
                    self.finish(*resume).await;
                    return;
                }
            }
        }
    }

    async fn run_steps(&mut self, activity: &Activity) -> Result<(), Fault> {
        for step in &activity.steps {
            match step {
                Step::Write { actuator, value } => {
                    let unavailable = |message: String| Fault {
                        kind: FaultKind::ActuatorUnavailable,
                        activity: activity.id.clone(),
                        capability: Some(actuator.clone()),
                        message,
                    };
                    let handle = self
                        .actuators
                        .get(actuator)
                        .ok_or_else(|| unavailable("actuator was not resolved".to_string()))?;
                    handle
                        .write(*value)
                        .await
                        .map_err(|err| unavailable(err.to_string()))?;
                    tracing::debug!(instance_id = %self.id, %actuator, value, "actuator written");
                }
                Step::Sample { sensor, window_ms } => {
                    let unavailable = |message: String| Fault {
                        kind: FaultKind::SensorUnavailable,
                        activity: activity.id.clone(),
                        capability: Some(sensor.clone()),
                        message,
                    };
                    let handle = self
                        .sensors
                        .get(sensor)
                        .ok_or_else(|| unavailable("sensor was not resolved".to_string()))?;
                    let sample = self
                        .sampler
                        .sample(handle, Duration::from_millis(*window_ms))
                        .await
                        .map_err(|err| unavailable(err.to_string()))?;
                    tracing::debug!(
                        instance_id = %self.id,
                        %sensor,
                        min = sample.min,
                        max = sample.max,
                        count = sample.count,
                        "sample taken"
                    );
                    self.last_sample = Some(sample);
                }
                Step::Send(request) => {
                    let completed =
                        tokio::time::timeout(self.send_timeout, self.remote.send(request.clone()))
                            .await
                            .is_ok();
                    if completed {
                        tracing::debug!(instance_id = %self.id, request = %request, "remote request sent");
                    } else {
                        tracing::warn!(
                            instance_id = %self.id,
                            request = %request,
                            timeout = ?self.send_timeout,
                            "remote send timed out, continuing"
                        );
                    }
                    self.publish(
                        EventType::RemoteRequestSent,
                        serde_json::json!({
                            "uri": &request.uri,
                            "method": request.method,
                            "completed": completed,
                        }),
                    )
                    .await;
                }
                Step::Log { message } => {
                    tracing::info!(instance_id = %self.id, activity = %activity.id, "{message}");
                }
            }
        }
        Ok(())
    }

    async fn arm_watch(&mut self, watch: ThresholdWatch) {
        tracing::info!(instance_id = %self.id, watch = %watch, "threshold watch armed");
        self.set_state(InstanceState::SuspendedOnThreshold(watch)).await;
    }

    async fn arm_wait(&mut self, wait: CancellationWait) {
        if let Some(abandoned) = self.handler.register(wait.clone()) {
            tracing::info!(
                instance_id = %self.id,
                abandoned = %abandoned.wait,
                replacement = %wait,
                "cancellation registration replaced"
            );
            let registration = self.handler.current().map(|r| r.id);
            self.publish(
                EventType::HandlerReplaced,
                serde_json::json!({
                    "abandoned": abandoned.id,
                    "abandoned_event": &abandoned.wait.event.name,
                    "registration": registration,
                    "event": &wait.event.name,
                }),
            )
            .await;
        } else {
            tracing::info!(instance_id = %self.id, wait = %wait, "cancellation wait armed");
        }
        self.set_state(InstanceState::SuspendedOnCancel(wait)).await;
    }

    /// End the current chain, re-arming its origin if asked to.
    async fn finish(&mut self, resume: Resume) {
        match (resume, self.origin.take()) {
            (Resume::Rearm, Some(Origin::Watch(watch))) => self.arm_watch(watch).await,
            (Resume::Rearm, Some(Origin::Wait(wait))) => self.arm_wait(wait).await,
            (Resume::Rearm, None) => {
                tracing::debug!(instance_id = %self.id, "nothing to re-arm, finalizing");
                self.set_state(InstanceState::Terminal).await;
            }
            (Resume::Finalize, _) => self.set_state(InstanceState::Terminal).await,
        }
    }

    async fn fault(&mut self, fault: Fault) {
        tracing::error!(
            instance_id = %self.id,
            kind = %fault.kind,
            activity = %fault.activity,
            capability = ?fault.capability,
            message = %fault.message,
            "instance faulted"
        );
        self.handler.clear();
        self.origin = None;
        self.publish(EventType::Faulted, serde_json::json!(&fault)).await;
        self.set_state(InstanceState::Faulted(fault)).await;
    }

    async fn set_state(&mut self, next: InstanceState) {
        let previous = std::mem::replace(&mut self.state, next);
        tracing::debug!(
            instance_id = %self.id,
            from = previous.name(),
            to = %self.state,
            "instance state changed"
        );
        if self.state.is_finished() {
            tracing::info!(instance_id = %self.id, state = %self.state, "instance finished");
        }
        self.publish(
            EventType::StateChanged,
            serde_json::json!({"from": previous.name(), "to": &self.state}),
        )
        .await;
    }

    async fn publish(&self, event_type: EventType, data: serde_json::Value) {
        let event = Event::new(event_type, self.id, data);
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(instance_id = %self.id, %err, %event_type, "failed to publish instance event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;

    use actiflow_domain::capability::CapabilityKind;
    use actiflow_domain::comparison::Comparison;
    use actiflow_domain::error::DeviceError;
    use actiflow_domain::remote::{Method, RemoteRequest};
    use actiflow_domain::sample::SampleField;

    // ── Test doubles ───────────────────────────────────────────────

    /// Ordered record of every actuator write, shared by all actuators.
    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Returns its current level, or `Disconnected` when unset.
    #[derive(Clone, Default)]
    struct TestSensor(Arc<Mutex<Option<f64>>>);

    impl TestSensor {
        fn at(level: f64) -> Self {
            Self(Arc::new(Mutex::new(Some(level))))
        }

        fn disconnected() -> Self {
            Self::default()
        }
    }

    impl Sensor for TestSensor {
        fn read(&self) -> impl Future<Output = Result<f64, DeviceError>> + Send {
            let level = *self.0.lock().unwrap();
            async move { level.ok_or(DeviceError::Disconnected) }
        }
    }

    #[derive(Clone)]
    struct TestActuator {
        name: &'static str,
        journal: Journal,
        available: bool,
    }

    impl Actuator for TestActuator {
        fn write(&self, value: f64) -> impl Future<Output = Result<(), DeviceError>> + Send {
            let result = if self.available {
                self.journal.0.lock().unwrap().push(format!("{}={value}", self.name));
                Ok(())
            } else {
                Err(DeviceError::Disconnected)
            };
            async move { result }
        }
    }

    #[derive(Default)]
    struct TestRegistry {
        sensors: HashMap<&'static str, TestSensor>,
        actuators: HashMap<&'static str, TestActuator>,
    }

    impl HandleRegistry for TestRegistry {
        type Sensor = TestSensor;
        type Actuator = TestActuator;

        fn sensor(&self, name: &CapabilityName) -> Result<TestSensor, UnknownCapabilityError> {
            self.sensors
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| UnknownCapabilityError {
                    name: name.clone(),
                    kind: CapabilityKind::Sensor,
                })
        }

        fn actuator(&self, name: &CapabilityName) -> Result<TestActuator, UnknownCapabilityError> {
            self.actuators
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| UnknownCapabilityError {
                    name: name.clone(),
                    kind: CapabilityKind::Actuator,
                })
        }
    }

    #[derive(Clone, Default)]
    struct SpyRemote {
        sent: Arc<Mutex<Vec<RemoteRequest>>>,
        stall: Option<Duration>,
    }

    impl SpyRemote {
        fn stalled(stall: Duration) -> Self {
            Self {
                sent: Arc::default(),
                stall: Some(stall),
            }
        }

        fn sent(&self) -> Vec<RemoteRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl RemoteChannel for SpyRemote {
        fn send(&self, request: RemoteRequest) -> impl Future<Output = ()> + Send {
            self.sent.lock().unwrap().push(request);
            let stall = self.stall;
            async move {
                if let Some(stall) = stall {
                    tokio::time::sleep(stall).await;
                }
            }
        }
    }

    #[derive(Clone, Default)]
    struct SpyPublisher(Arc<Mutex<Vec<Event>>>);

    impl SpyPublisher {
        fn types(&self) -> Vec<EventType> {
            self.0.lock().unwrap().iter().map(|e| e.event_type).collect()
        }
    }

    impl EventPublisher for SpyPublisher {
        fn publish(&self, event: Event) -> impl Future<Output = Result<(), ActiflowError>> + Send {
            self.0.lock().unwrap().push(event);
            async { Ok(()) }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────

    type TestInstance = Instance<TestSensor, TestActuator, SpyRemote, SpyPublisher>;

    struct Fixture {
        registry: TestRegistry,
        journal: Journal,
        remote: SpyRemote,
        publisher: SpyPublisher,
    }

    impl Fixture {
        fn new(brightness: TestSensor, sound: TestSensor) -> Self {
            let journal = Journal::default();
            let mut registry = TestRegistry::default();
            registry.sensors.insert("brightness", brightness);
            registry.sensors.insert("sound", sound);
            for name in ["buzzer", "led"] {
                registry.actuators.insert(
                    name,
                    TestActuator {
                        name,
                        journal: journal.clone(),
                        available: true,
                    },
                );
            }
            Self {
                registry,
                journal,
                remote: SpyRemote::default(),
                publisher: SpyPublisher::default(),
            }
        }

        fn with_sound(level: f64) -> Self {
            Self::new(TestSensor::at(950.0), TestSensor::at(level))
        }

        fn instance(&self, graph: ActivityGraph) -> Result<TestInstance, ActiflowError> {
            Instance::new(
                graph,
                &self.registry,
                self.remote.clone(),
                self.publisher.clone(),
                Sampler::new(Duration::from_millis(100)),
            )
        }
    }

    fn brightness() -> CapabilityName {
        CapabilityName::new("brightness")
    }

    fn cancel_alarm() -> EventKey {
        EventKey::new("cancel alarm", Method::Put)
    }

    fn alarm_graph() -> ActivityGraph {
        ActivityGraph::builder()
            .name("alarm")
            .activity(
                Activity::new("start")
                    .write("led", 0.0)
                    .await_threshold("brightness", Comparison::Lt, 900.0, "activity2"),
            )
            .activity(
                Activity::new("activity2")
                    .log("sampling sound")
                    .sample("sound", 6000)
                    .then("split_xor3"),
            )
            .activity(Activity::new("split_xor3").branch(
                SampleField::Max,
                Comparison::Gt,
                1000.0,
                "activity5",
                "activity4",
            ))
            .activity(Activity::new("activity4"))
            .activity(
                Activity::new("activity5")
                    .write("buzzer", 500.0)
                    .write("led", 1.0)
                    .then("activity6"),
            )
            .activity(
                Activity::new("activity6")
                    .send("coap://hub/object/42/alarm", Method::Put, "ON")
                    .then("await7"),
            )
            .activity(Activity::new("await7").await_event("cancel alarm", Method::Put, "activity8"))
            .activity(
                Activity::new("activity8")
                    .write("buzzer", 0.0)
                    .write("led", 0.0)
                    .then("activity9"),
            )
            .activity(Activity::new("activity9"))
            .build()
            .unwrap()
    }

    fn rearming_watch_graph() -> ActivityGraph {
        ActivityGraph::builder()
            .name("night light")
            .activity(Activity::new("wait").await_threshold(
                "brightness",
                Comparison::Lt,
                900.0,
                "light",
            ))
            .activity(Activity::new("light").write("led", 1.0).end(Resume::Rearm))
            .build()
            .unwrap()
    }

    // ── Tests ──────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_run_alarm_scenario_to_terminal() {
        let fixture = Fixture::with_sound(1500.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();

        assert_eq!(instance.start().await, Outcome::Started);
        assert!(matches!(
            instance.state(),
            InstanceState::SuspendedOnThreshold(w) if w.threshold == 900.0 && w.comparison == Comparison::Lt
        ));
        assert_eq!(fixture.journal.entries(), vec!["led=0"]);

        assert_eq!(instance.deliver_reading(&brightness(), 850.0).await, Outcome::Fired);
        assert!(matches!(
            instance.state(),
            InstanceState::SuspendedOnCancel(w) if w.event == cancel_alarm()
        ));
        assert_eq!(fixture.journal.entries(), vec!["led=0", "buzzer=500", "led=1"]);
        let sent = fixture.remote.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Put);
        assert_eq!(sent[0].payload, "ON");
        assert!((instance.last_sample().unwrap().max - 1500.0).abs() < f64::EPSILON);

        assert_eq!(instance.deliver_event(&cancel_alarm()).await, Outcome::Fired);
        assert_eq!(instance.state(), &InstanceState::Terminal);
        assert_eq!(
            fixture.journal.entries(),
            vec!["led=0", "buzzer=500", "led=1", "buzzer=0", "led=0"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_stall_on_unresponsive_remote() {
        let mut fixture = Fixture::with_sound(1500.0);
        fixture.remote = SpyRemote::stalled(Duration::from_secs(30));
        let mut instance = fixture
            .instance(alarm_graph())
            .unwrap()
            .with_send_timeout(Duration::from_millis(500));

        instance.start().await;
        let began = tokio::time::Instant::now();
        assert_eq!(instance.deliver_reading(&brightness(), 850.0).await, Outcome::Fired);

        assert!(began.elapsed() < Duration::from_secs(30));
        assert!(matches!(
            instance.state(),
            InstanceState::SuspendedOnCancel(w) if w.event == cancel_alarm()
        ));
        assert_eq!(fixture.journal.entries(), vec!["led=0", "buzzer=500", "led=1"]);
        assert_eq!(fixture.remote.sent().len(), 1);
        let events = fixture.publisher.0.lock().unwrap().clone();
        let sent = events
            .iter()
            .find(|e| e.event_type == EventType::RemoteRequestSent)
            .unwrap();
        assert_eq!(sent.data["completed"], false);

        assert_eq!(instance.deliver_event(&cancel_alarm()).await, Outcome::Fired);
        assert_eq!(instance.state(), &InstanceState::Terminal);
    }

    #[tokio::test(start_paused = true)]
    async fn should_reach_terminal_without_side_effects_on_negative_branch() {
        let fixture = Fixture::with_sound(400.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();

        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;

        assert_eq!(instance.state(), &InstanceState::Terminal);
        assert_eq!(fixture.journal.entries(), vec!["led=0"]);
        assert!(fixture.remote.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_fault_when_sampling_sensor_is_unavailable() {
        let fixture = Fixture::new(TestSensor::at(950.0), TestSensor::disconnected());
        let mut instance = fixture.instance(alarm_graph()).unwrap();

        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;

        match instance.state() {
            InstanceState::Faulted(fault) => {
                assert_eq!(fault.kind, FaultKind::SensorUnavailable);
                assert_eq!(fault.activity.as_str(), "activity2");
                assert_eq!(fault.capability, Some(CapabilityName::new("sound")));
            }
            other => panic!("expected faulted, got {other}"),
        }
        assert_eq!(fixture.journal.entries(), vec!["led=0"]);
        assert!(fixture.remote.sent().is_empty());
        assert!(fixture.publisher.types().contains(&EventType::Faulted));
    }

    #[tokio::test(start_paused = true)]
    async fn should_fault_when_actuator_write_fails() {
        let mut fixture = Fixture::with_sound(1500.0);
        if let Some(buzzer) = fixture.registry.actuators.get_mut("buzzer") {
            buzzer.available = false;
        }
        let mut instance = fixture.instance(alarm_graph()).unwrap();

        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;

        assert!(matches!(
            instance.state(),
            InstanceState::Faulted(f) if f.kind == FaultKind::ActuatorUnavailable
        ));
        assert_eq!(fixture.journal.entries(), vec!["led=0"]);
        assert!(fixture.remote.sent().is_empty());
    }

    #[test]
    fn should_fail_construction_for_unknown_capability() {
        let mut fixture = Fixture::with_sound(1500.0);
        fixture.registry.sensors.remove("sound");

        let result = fixture.instance(alarm_graph());

        match result {
            Err(ActiflowError::UnknownCapability(err)) => {
                assert_eq!(err.name.as_str(), "sound");
                assert_eq!(err.kind, CapabilityKind::Sensor);
            }
            Err(other) => panic!("expected unknown capability, got {other:?}"),
            Ok(_) => panic!("expected unknown capability, got an instance"),
        }
        assert!(fixture.journal.entries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_reading_that_does_not_cross_threshold() {
        let fixture = Fixture::with_sound(1500.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();
        instance.start().await;

        assert_eq!(instance.deliver_reading(&brightness(), 950.0).await, Outcome::Ignored);
        assert_eq!(instance.deliver_reading(&brightness(), 900.0).await, Outcome::Ignored);
        assert!(matches!(instance.state(), InstanceState::SuspendedOnThreshold(_)));
        assert_eq!(fixture.journal.entries(), vec!["led=0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_watch_exactly_once() {
        let fixture = Fixture::with_sound(1500.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();
        instance.start().await;

        assert_eq!(instance.deliver_reading(&brightness(), 850.0).await, Outcome::Fired);
        assert_eq!(instance.deliver_reading(&brightness(), 800.0).await, Outcome::Ignored);

        let fired = fixture
            .publisher
            .types()
            .into_iter()
            .filter(|t| *t == EventType::WatchFired)
            .count();
        assert_eq!(fired, 1);
        assert_eq!(fixture.remote.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_rearm_identical_watch_when_chain_ends_with_rearm() {
        let fixture = Fixture::with_sound(0.0);
        let mut instance = fixture.instance(rearming_watch_graph()).unwrap();
        instance.start().await;
        let armed = instance.state().clone();

        assert_eq!(instance.deliver_reading(&brightness(), 850.0).await, Outcome::Fired);
        assert_eq!(instance.state(), &armed);

        assert_eq!(instance.deliver_reading(&brightness(), 700.0).await, Outcome::Fired);
        assert_eq!(instance.state(), &armed);
        assert_eq!(fixture.journal.entries(), vec!["led=1", "led=1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_rearm_wait_when_chain_ends_with_rearm() {
        let graph = ActivityGraph::builder()
            .name("doorbell")
            .activity(Activity::new("listen").await_event("ring", Method::Post, "chime"))
            .activity(Activity::new("chime").write("buzzer", 1.0).end(Resume::Rearm))
            .build()
            .unwrap();
        let fixture = Fixture::with_sound(0.0);
        let mut instance = fixture.instance(graph).unwrap();
        instance.start().await;

        let ring = EventKey::new("ring", Method::Post);
        assert_eq!(instance.deliver_event(&ring).await, Outcome::Fired);
        assert_eq!(instance.deliver_event(&ring).await, Outcome::Fired);
        assert!(matches!(instance.state(), InstanceState::SuspendedOnCancel(_)));
        assert_eq!(fixture.journal.entries(), vec!["buzzer=1", "buzzer=1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_finalize_rearm_without_origin() {
        let graph = ActivityGraph::builder()
            .name("one shot")
            .activity(Activity::new("only").write("led", 1.0).end(Resume::Rearm))
            .build()
            .unwrap();
        let fixture = Fixture::with_sound(0.0);
        let mut instance = fixture.instance(graph).unwrap();

        instance.start().await;

        assert_eq!(instance.state(), &InstanceState::Terminal);
    }

    #[tokio::test(start_paused = true)]
    async fn should_never_run_replaced_wait_continuation() {
        let fixture = Fixture::with_sound(1500.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();
        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;

        let snooze = CancellationWait {
            event: EventKey::new("snooze", Method::Put),
            continuation: ActivityId::from("activity9"),
        };
        assert_eq!(instance.register_handler(snooze.clone()).await, Outcome::Replaced);
        assert_eq!(instance.state(), &InstanceState::SuspendedOnCancel(snooze.clone()));
        assert!(fixture.publisher.types().contains(&EventType::HandlerReplaced));

        assert_eq!(instance.deliver_event(&cancel_alarm()).await, Outcome::Ignored);
        assert!(matches!(instance.state(), InstanceState::SuspendedOnCancel(_)));

        assert_eq!(instance.deliver_event(&snooze.event).await, Outcome::Fired);
        assert_eq!(instance.state(), &InstanceState::Terminal);
        assert!(!fixture.journal.entries().contains(&"buzzer=0".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_registration_unless_suspended_on_cancel() {
        let fixture = Fixture::with_sound(1500.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();
        instance.start().await;

        let wait = CancellationWait {
            event: cancel_alarm(),
            continuation: ActivityId::from("activity8"),
        };
        assert_eq!(instance.register_handler(wait).await, Outcome::Ignored);
        assert!(matches!(instance.state(), InstanceState::SuspendedOnThreshold(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_registration_with_undefined_continuation() {
        let fixture = Fixture::with_sound(1500.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();
        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;

        let wait = CancellationWait {
            event: EventKey::new("snooze", Method::Put),
            continuation: ActivityId::from("ghost"),
        };
        assert_eq!(instance.register_handler(wait).await, Outcome::Ignored);
        assert!(matches!(
            instance.state(),
            InstanceState::SuspendedOnCancel(w) if w.event == cancel_alarm()
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_every_input_once_terminal() {
        let fixture = Fixture::with_sound(400.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();
        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;
        assert_eq!(instance.state(), &InstanceState::Terminal);
        let events_before = fixture.publisher.types().len();

        let inputs = [
            InstanceInput::Start,
            InstanceInput::Reading {
                sensor: brightness(),
                value: 10.0,
            },
            InstanceInput::Event(cancel_alarm()),
            InstanceInput::RegisterHandler(CancellationWait {
                event: cancel_alarm(),
                continuation: ActivityId::from("activity8"),
            }),
        ];
        for input in inputs {
            assert_eq!(instance.handle(input).await, Outcome::Ignored);
        }

        assert_eq!(instance.state(), &InstanceState::Terminal);
        assert_eq!(fixture.journal.entries(), vec!["led=0"]);
        assert_eq!(fixture.publisher.types().len(), events_before);
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_every_input_once_faulted() {
        let fixture = Fixture::new(TestSensor::at(950.0), TestSensor::disconnected());
        let mut instance = fixture.instance(alarm_graph()).unwrap();
        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;
        let faulted = instance.state().clone();

        assert_eq!(instance.deliver_reading(&brightness(), 10.0).await, Outcome::Ignored);
        assert_eq!(instance.deliver_event(&cancel_alarm()).await, Outcome::Ignored);
        assert_eq!(instance.start().await, Outcome::Ignored);
        assert_eq!(instance.state(), &faulted);
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_state_changes_in_order() {
        let fixture = Fixture::with_sound(400.0);
        let mut instance = fixture.instance(alarm_graph()).unwrap();

        instance.start().await;
        instance.deliver_reading(&brightness(), 850.0).await;

        let events = fixture.publisher.0.lock().unwrap().clone();
        assert!(events.iter().all(|e| e.instance_id == instance.id()));
        let targets: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == EventType::StateChanged)
            .map(|e| e.data["to"]["state"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            targets,
            vec![
                "running",
                "suspended_on_threshold",
                "running",
                "running",
                "running",
                "terminal"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_evaluate_branch_without_sample_as_false() {
        let graph = ActivityGraph::builder()
            .name("no sample")
            .activity(Activity::new("split").branch(
                SampleField::Max,
                Comparison::Gt,
                1000.0,
                "loud",
                "quiet",
            ))
            .activity(Activity::new("loud").write("buzzer", 1.0))
            .activity(Activity::new("quiet").write("led", 1.0))
            .build()
            .unwrap();
        let fixture = Fixture::with_sound(0.0);
        let mut instance = fixture.instance(graph).unwrap();

        instance.start().await;

        assert_eq!(fixture.journal.entries(), vec!["led=1"]);
        assert!(instance.last_sample().is_none());
    }
}
