//! Instance state machine vocabulary.
//!
//! An automation instance is always in exactly one [`InstanceState`]. The
//! executor in the `app` crate owns the transitions; this module only names
//! the states and the fault record a faulted instance carries.

use serde::{Deserialize, Serialize};

use crate::graph::{CancellationWait, ThresholdWatch};
use crate::id::{ActivityId, CapabilityName};

/// Lifecycle state of one automation instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum InstanceState {
    /// Created, not started.
    Idle,
    /// A continuation chain is executing the named activity.
    Running(ActivityId),
    /// Waiting for a reading that satisfies the armed watch.
    SuspendedOnThreshold(ThresholdWatch),
    /// Waiting for the registered cancellation event.
    SuspendedOnCancel(CancellationWait),
    /// Finished normally. Absorbing.
    Terminal,
    /// Stopped by a collaborator failure. Absorbing.
    Faulted(Fault),
}

impl InstanceState {
    /// Short machine-readable name, used in logs and events.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running(_) => "running",
            Self::SuspendedOnThreshold(_) => "suspended_on_threshold",
            Self::SuspendedOnCancel(_) => "suspended_on_cancel",
            Self::Terminal => "terminal",
            Self::Faulted(_) => "faulted",
        }
    }

    /// Whether the instance will never transition again.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Terminal | Self::Faulted(_))
    }

    /// Whether the instance is parked on a watch or a wait.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        matches!(
            self,
            Self::SuspendedOnThreshold(_) | Self::SuspendedOnCancel(_)
        )
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running(activity) => write!(f, "running({activity})"),
            Self::SuspendedOnThreshold(watch) => write!(f, "suspended_on_threshold({watch})"),
            Self::SuspendedOnCancel(wait) => write!(f, "suspended_on_cancel({wait})"),
            Self::Faulted(fault) => write!(f, "faulted({fault})"),
            Self::Idle | Self::Terminal => f.write_str(self.name()),
        }
    }
}

/// What kind of failure stopped the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    SensorUnavailable,
    ActuatorUnavailable,
    /// The graph led to an activity it does not define.
    UndefinedActivity,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SensorUnavailable => f.write_str("sensor unavailable"),
            Self::ActuatorUnavailable => f.write_str("actuator unavailable"),
            Self::UndefinedActivity => f.write_str("undefined activity"),
        }
    }
}

/// Record of the failure that moved an instance to [`InstanceState::Faulted`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    /// Activity that was running when the failure happened.
    pub activity: ActivityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityName>,
    pub message: String,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in {}", self.kind, self.activity)?;
        if let Some(capability) = &self.capability {
            write!(f, " ({capability})")?;
        }
        write!(f, ": {}", self.message)
    }
}
