//! Activity — a named unit of work and the edge it leaves by.

use serde::{Deserialize, Serialize};

use crate::comparison::Comparison;
use crate::id::{ActivityId, CapabilityName};
use crate::remote::{EventKey, Method, RemoteRequest};
use crate::sample::SampleField;

use super::edge::{CancellationWait, ConditionalEdge, Predicate, ThresholdWatch};

/// A side effect performed while an activity runs. Steps run in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Set an actuator to a value.
    Write { actuator: CapabilityName, value: f64 },
    /// Sample a sensor for `window_ms` and keep the result as the most
    /// recent sample.
    Sample {
        sensor: CapabilityName,
        window_ms: u64,
    },
    /// Fire-and-forget remote request.
    Send(RemoteRequest),
    /// Emit a log line.
    Log { message: String },
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { actuator, value } => write!(f, "write({actuator}, {value})"),
            Self::Sample { sensor, window_ms } => write!(f, "sample({sensor}, {window_ms}ms)"),
            Self::Send(request) => write!(f, "send({request})"),
            Self::Log { message } => write!(f, "log({message:?})"),
        }
    }
}

/// The decision a continuation chain returns when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resume {
    /// Re-arm the watch or wait whose firing started this chain.
    Rearm,
    /// Stop; the instance becomes terminal.
    #[default]
    Finalize,
}

/// How control leaves an activity once its steps are done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Exit {
    /// Run the next activity immediately.
    Next { activity: ActivityId },
    /// Evaluate a predicate over the most recent sample and run one successor.
    Branch(ConditionalEdge),
    /// Arm a threshold watch and suspend.
    AwaitThreshold(ThresholdWatch),
    /// Arm the cancellation wait and suspend.
    AwaitEvent(CancellationWait),
    /// End of a chain.
    End {
        #[serde(default)]
        resume: Resume,
    },
}

impl Default for Exit {
    fn default() -> Self {
        Self::End {
            resume: Resume::Finalize,
        }
    }
}

/// A named unit of automation logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub exit: Exit,
}

impl Activity {
    /// An activity with no steps that finalizes.
    #[must_use]
    pub fn new(id: impl Into<ActivityId>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
            exit: Exit::default(),
        }
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn write(self, actuator: impl Into<CapabilityName>, value: f64) -> Self {
        self.step(Step::Write {
            actuator: actuator.into(),
            value,
        })
    }

    #[must_use]
    pub fn sample(self, sensor: impl Into<CapabilityName>, window_ms: u64) -> Self {
        self.step(Step::Sample {
            sensor: sensor.into(),
            window_ms,
        })
    }

    #[must_use]
    pub fn send(self, uri: impl Into<String>, method: Method, payload: impl Into<String>) -> Self {
        self.step(Step::Send(RemoteRequest {
            uri: uri.into(),
            method,
            payload: payload.into(),
        }))
    }

    #[must_use]
    pub fn log(self, message: impl Into<String>) -> Self {
        self.step(Step::Log {
            message: message.into(),
        })
    }

    #[must_use]
    pub fn exit(mut self, exit: Exit) -> Self {
        self.exit = exit;
        self
    }

    #[must_use]
    pub fn then(self, next: impl Into<ActivityId>) -> Self {
        self.exit(Exit::Next {
            activity: next.into(),
        })
    }

    #[must_use]
    pub fn branch(
        self,
        field: SampleField,
        comparison: Comparison,
        value: f64,
        then: impl Into<ActivityId>,
        otherwise: impl Into<ActivityId>,
    ) -> Self {
        self.exit(Exit::Branch(ConditionalEdge {
            predicate: Predicate {
                field,
                comparison,
                value,
            },
            then: then.into(),
            otherwise: otherwise.into(),
        }))
    }

    #[must_use]
    pub fn await_threshold(
        self,
        sensor: impl Into<CapabilityName>,
        comparison: Comparison,
        threshold: f64,
        continuation: impl Into<ActivityId>,
    ) -> Self {
        self.exit(Exit::AwaitThreshold(ThresholdWatch {
            sensor: sensor.into(),
            comparison,
            threshold,
            continuation: continuation.into(),
        }))
    }

    #[must_use]
    pub fn await_event(
        self,
        name: impl Into<String>,
        method: Method,
        continuation: impl Into<ActivityId>,
    ) -> Self {
        self.exit(Exit::AwaitEvent(CancellationWait {
            event: EventKey::new(name, method),
            continuation: continuation.into(),
        }))
    }

    #[must_use]
    pub fn end(self, resume: Resume) -> Self {
        self.exit(Exit::End { resume })
    }

    /// Every activity this one can lead to, suspended or not.
    #[must_use]
    pub fn successors(&self) -> Vec<&ActivityId> {
        match &self.exit {
            Exit::Next { activity } => vec![activity],
            Exit::Branch(edge) => vec![&edge.then, &edge.otherwise],
            Exit::AwaitThreshold(watch) => vec![&watch.continuation],
            Exit::AwaitEvent(wait) => vec![&wait.continuation],
            Exit::End { .. } => Vec::new(),
        }
    }

    /// Successors reached without passing a suspension point.
    #[must_use]
    pub fn chained_successors(&self) -> Vec<&ActivityId> {
        match &self.exit {
            Exit::Next { activity } => vec![activity],
            Exit::Branch(edge) => vec![&edge.then, &edge.otherwise],
            Exit::AwaitThreshold(_) | Exit::AwaitEvent(_) | Exit::End { .. } => Vec::new(),
        }
    }

    /// Whether every numeric value in the activity is finite.
    pub(crate) fn has_finite_values(&self) -> bool {
        let steps_ok = self.steps.iter().all(|step| match step {
            Step::Write { value, .. } => value.is_finite(),
            Step::Sample { .. } | Step::Send(_) | Step::Log { .. } => true,
        });
        let exit_ok = match &self.exit {
            Exit::Branch(edge) => edge.predicate.value.is_finite(),
            Exit::AwaitThreshold(watch) => watch.threshold.is_finite(),
            Exit::Next { .. } | Exit::AwaitEvent(_) | Exit::End { .. } => true,
        };
        steps_ok && exit_ok
    }
}
