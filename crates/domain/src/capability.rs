//! Capability — a named sensor or actuator exposed by the device.
//!
//! The engine never talks to hardware directly. It asks the handle
//! registry for capabilities by [`CapabilityName`](crate::id::CapabilityName)
//! once, at instance construction, and keeps the resolved handles for the
//! instance's lifetime.

use serde::{Deserialize, Serialize};

/// Whether a capability produces readings or accepts writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Sensor,
    Actuator,
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sensor => f.write_str("sensor"),
            Self::Actuator => f.write_str("actuator"),
        }
    }
}
