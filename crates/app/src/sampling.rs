//! Sampling primitive — a time-bounded read aggregated into statistics.

use std::time::Duration;

use tokio::time::Instant;

use actiflow_domain::error::DeviceError;
use actiflow_domain::sample::{SampleAccumulator, SampleResult};

use crate::ports::Sensor;

/// Default delay between two reads inside a window.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads a sensor repeatedly over a window and aggregates the readings.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    poll_interval: Duration,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Sampler {
    /// Create a sampler reading every `poll_interval`.
    ///
    /// A zero interval is raised to one millisecond.
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Sample `sensor` for at least `window`.
    ///
    /// Reads once immediately, then every poll interval until the window
    /// deadline has passed, so the observed interval is never shorter than
    /// `window`. A failed read is skipped; the window keeps going. A read
    /// still pending at the deadline is abandoned, so the call never takes
    /// much longer than `window`.
    ///
    /// # Errors
    ///
    /// Returns the last read error, or [`DeviceError::NoReadings`], if not a
    /// single read succeeded during the window.
    pub async fn sample<S: Sensor>(
        &self,
        sensor: &S,
        window: Duration,
    ) -> Result<SampleResult, DeviceError> {
        let started = Instant::now();
        let deadline = started + window;
        let mut readings = SampleAccumulator::default();
        let mut last_error = None;

        loop {
            match tokio::time::timeout_at(deadline, sensor.read()).await {
                Ok(Ok(value)) => readings.push(value),
                Ok(Err(err)) => {
                    tracing::debug!(%err, "sensor read failed inside sampling window");
                    last_error = Some(err);
                }
                Err(_) => {
                    tracing::debug!("sensor read still pending at window deadline");
                    break;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }

        let elapsed = started.elapsed();
        tracing::trace!(
            count = readings.count(),
            elapsed = ?elapsed,
            "sampling window closed"
        );
        readings
            .finish(elapsed)
            .ok_or_else(|| last_error.unwrap_or(DeviceError::NoReadings))
    }
}
