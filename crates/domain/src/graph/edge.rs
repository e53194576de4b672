//! Edges out of an activity — conditional branches and suspension points.

use serde::{Deserialize, Serialize};

use crate::comparison::Comparison;
use crate::id::{ActivityId, CapabilityName};
use crate::remote::EventKey;
use crate::sample::{SampleField, SampleResult};

/// An armed comparison against a sensor's delivered readings.
///
/// When a reading for `sensor` satisfies `reading <comparison> threshold`,
/// the watch is disarmed and `continuation` runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdWatch {
    pub sensor: CapabilityName,
    pub comparison: Comparison,
    pub threshold: f64,
    pub continuation: ActivityId,
}

impl ThresholdWatch {
    /// Whether a reading delivered for `sensor` fires this watch.
    #[must_use]
    pub fn fires_on(&self, sensor: &CapabilityName, reading: f64) -> bool {
        self.sensor == *sensor && self.comparison.holds(reading, self.threshold)
    }
}

impl std::fmt::Display for ThresholdWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} -> {}",
            self.sensor, self.comparison, self.threshold, self.continuation
        )
    }
}

/// A pending wait for one external event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationWait {
    pub event: EventKey,
    pub continuation: ActivityId,
}

impl std::fmt::Display for CancellationWait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.event, self.continuation)
    }
}

/// A pure test over the most recent [`SampleResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: SampleField,
    pub comparison: Comparison,
    pub value: f64,
}

impl Predicate {
    /// Evaluate against the most recent sample, if any.
    ///
    /// With no sample taken yet the predicate is false.
    #[must_use]
    pub fn evaluate(&self, sample: Option<&SampleResult>) -> bool {
        sample.is_some_and(|s| self.comparison.holds(s.field(self.field), self.value))
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.comparison, self.value)
    }
}

/// Two-way branch on a [`Predicate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalEdge {
    pub predicate: Predicate,
    pub then: ActivityId,
    pub otherwise: ActivityId,
}

impl ConditionalEdge {
    /// Pick exactly one successor.
    #[must_use]
    pub fn select(&self, sample: Option<&SampleResult>) -> &ActivityId {
        if self.predicate.evaluate(sample) {
            &self.then
        } else {
            &self.otherwise
        }
    }
}
