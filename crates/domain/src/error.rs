//! Common error types used across the workspace.
//!
//! Each failure family has its own typed error and converts into
//! [`ActiflowError`] via `#[from]`.

use crate::capability::CapabilityKind;
use crate::id::{ActivityId, CapabilityName};

/// Top-level error for engine construction and instance control.
#[derive(Debug, thiserror::Error)]
pub enum ActiflowError {
    /// A graph definition broke one of its invariants.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A capability referenced by the graph could not be resolved.
    #[error("capability resolution failed")]
    UnknownCapability(#[from] UnknownCapabilityError),

    /// A graph definition could not be parsed.
    #[error("malformed graph definition")]
    Definition(#[from] serde_json::Error),

    /// The instance reached a terminal state and no longer accepts input.
    #[error("automation instance is no longer running")]
    InstanceClosed,
}

/// Invariant violations in an activity graph definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("graph name must not be empty")]
    EmptyName,

    #[error("graph has no activities")]
    NoActivities,

    #[error("entry activity {0} is not defined")]
    MissingEntry(ActivityId),

    #[error("activity {0} is defined more than once")]
    DuplicateActivity(ActivityId),

    #[error("activity {from} leads to undefined activity {to}")]
    UndefinedActivity { from: ActivityId, to: ActivityId },

    #[error("activity {activity} uses a non-finite value")]
    NonFiniteValue { activity: ActivityId },

    /// Activities chained only by `next`/`branch` edges loop back on
    /// themselves, so the chain would never reach a suspension point.
    #[error("activities {0:?} form a cycle without a suspension point")]
    UnboundedChain(Vec<ActivityId>),
}

/// A capability name that the handle registry does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no {kind} named {name:?} is registered")]
pub struct UnknownCapabilityError {
    pub name: CapabilityName,
    pub kind: CapabilityKind,
}

/// Failure reported by a sensor or actuator collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device did not answer at all.
    #[error("device is disconnected")]
    Disconnected,

    /// A sampling window closed without a single successful reading.
    #[error("no reading succeeded during the sampling window")]
    NoReadings,
}

/// A best-effort remote request could not be delivered.
///
/// Transports log this and drop it; it never reaches the executor.
#[derive(Debug, thiserror::Error)]
#[error("failed to deliver {method} request to {uri}")]
pub struct RemoteSendFailure {
    pub uri: String,
    pub method: crate::remote::Method,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}
