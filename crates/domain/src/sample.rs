//! Sample results — aggregate statistics over a sampling window.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Statistics computed over every reading observed during one window.
///
/// Created by the sampling primitive, consumed by the next branch
/// predicate, then replaced by the following sample. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Number of successful readings that went into the statistics.
    pub count: u32,
    /// Length of the window actually observed, in milliseconds.
    pub window_ms: u64,
}

impl SampleResult {
    /// Project one statistic out of the result.
    #[must_use]
    pub fn field(&self, field: SampleField) -> f64 {
        match field {
            SampleField::Min => self.min,
            SampleField::Max => self.max,
            SampleField::Mean => self.mean,
            SampleField::Count => f64::from(self.count),
        }
    }
}

/// Which statistic of a [`SampleResult`] a predicate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleField {
    Min,
    Max,
    Mean,
    Count,
}

impl std::fmt::Display for SampleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Min => f.write_str("min"),
            Self::Max => f.write_str("max"),
            Self::Mean => f.write_str("mean"),
            Self::Count => f.write_str("count"),
        }
    }
}

/// Running min/max/sum over readings as they arrive.
#[derive(Debug, Clone, Default)]
pub struct SampleAccumulator {
    min: f64,
    max: f64,
    sum: f64,
    count: u32,
}

impl SampleAccumulator {
    /// Fold one reading into the statistics. Non-finite readings are dropped.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count = self.count.saturating_add(1);
    }

    /// Number of readings folded so far.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Close the window. Returns `None` if no reading was folded.
    #[must_use]
    pub fn finish(self, elapsed: Duration) -> Option<SampleResult> {
        if self.count == 0 {
            return None;
        }
        Some(SampleResult {
            min: self.min,
            max: self.max,
            mean: self.sum / f64::from(self.count),
            count: self.count,
            window_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
