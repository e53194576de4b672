//! Sensor feed — polls a sensor and delivers each reading to an instance.
//!
//! Threshold watches are edge-triggered on delivered readings: a level that
//! crosses and recovers between two polls is never seen by the instance.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use actiflow_domain::id::CapabilityName;

use crate::ports::Sensor;
use crate::runner::InstanceHandle;

/// Background loop reading one sensor at a fixed interval.
pub struct SensorFeed<S> {
    name: CapabilityName,
    sensor: S,
    interval: Duration,
    instance: InstanceHandle,
}

impl<S: Sensor + 'static> SensorFeed<S> {
    /// Spawn the feed. It stops by itself once the instance no longer
    /// accepts input.
    pub fn start(
        name: CapabilityName,
        sensor: S,
        interval: Duration,
        instance: InstanceHandle,
    ) -> JoinHandle<()> {
        let feed = Self {
            name,
            sensor,
            interval: interval.max(Duration::from_millis(1)),
            instance,
        };
        tokio::spawn(feed.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(sensor = %self.name, interval = ?self.interval, "sensor feed started");

        loop {
            ticker.tick().await;
            if self.instance.state().is_finished() {
                break;
            }
            match self.sensor.read().await {
                Ok(value) => {
                    if self
                        .instance
                        .deliver_reading(self.name.clone(), value)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(sensor = %self.name, %err, "sensor read failed, retrying next interval");
                }
            }
        }
        tracing::info!(sensor = %self.name, "sensor feed stopped");
    }
}

/// Shorthand for [`SensorFeed::start`].
pub fn spawn_sensor_feed<S: Sensor + 'static>(
    name: CapabilityName,
    sensor: S,
    interval: Duration,
    instance: InstanceHandle,
) -> JoinHandle<()> {
    SensorFeed::start(name, sensor, interval, instance)
}
