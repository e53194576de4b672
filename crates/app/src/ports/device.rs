//! Capability ports — the sensor and actuator handles the executor drives.
//!
//! A handle is resolved once by name through the
//! [`HandleRegistry`](super::HandleRegistry) and then used for the whole
//! life of an instance.

use std::future::Future;

use actiflow_domain::error::DeviceError;

/// A readable capability (light level, sound level, temperature, ...).
pub trait Sensor: Send + Sync {
    /// Take one reading.
    fn read(&self) -> impl Future<Output = Result<f64, DeviceError>> + Send;
}

/// A writable capability (buzzer, LED, relay, ...).
pub trait Actuator: Send + Sync {
    /// Set the actuator to `value`.
    fn write(&self, value: f64) -> impl Future<Output = Result<(), DeviceError>> + Send;
}

impl<T: Sensor> Sensor for std::sync::Arc<T> {
    fn read(&self) -> impl Future<Output = Result<f64, DeviceError>> + Send {
        (**self).read()
    }
}

impl<T: Actuator> Actuator for std::sync::Arc<T> {
    fn write(&self, value: f64) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).write(value)
    }
}
