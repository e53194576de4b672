//! Event — an immutable record of something that happened to an instance.
//!
//! Events are produced on every state transition, when a watch or wait
//! fires, when a registration is replaced, and when an instance faults.
//! They exist for observability; nothing in the engine consumes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{EventId, InstanceId};

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StateChanged,
    WatchFired,
    WaitFired,
    HandlerReplaced,
    RemoteRequestSent,
    Faulted,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StateChanged => "state_changed",
            Self::WatchFired => "watch_fired",
            Self::WaitFired => "wait_fired",
            Self::HandlerReplaced => "handler_replaced",
            Self::RemoteRequestSent => "remote_request_sent",
            Self::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub instance_id: InstanceId,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(event_type: EventType, instance_id: InstanceId, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            instance_id,
            data,
            timestamp: Utc::now(),
        }
    }
}
