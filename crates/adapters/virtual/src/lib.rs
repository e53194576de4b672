//! # actiflow-adapter-virtual
//!
//! Virtual board that provides simulated capabilities for testing and
//! demonstration purposes.
//!
//! ## Provided capabilities
//!
//! | Name | Kind | Default |
//! |------|------|---------|
//! | `brightness` | sensor | 1000 (lit room) |
//! | `sound` | sensor | 0 (silence) |
//! | `buzzer` | actuator | records writes |
//! | `led` | actuator | records writes |
//!
//! [`VirtualRemote`] stands in for the remote transport, and
//! [`demo::alarm_graph`] is the graph these capabilities were made for.
//!
//! ## Dependency rule
//!
//! Depends on `actiflow-app` (port traits) and `actiflow-domain` only.

pub mod demo;
mod devices;
mod remote;

use std::collections::BTreeMap;

use actiflow_app::ports::HandleRegistry;
use actiflow_domain::capability::CapabilityKind;
use actiflow_domain::error::UnknownCapabilityError;
use actiflow_domain::id::CapabilityName;

pub use devices::{VirtualActuator, VirtualSensor};
pub use remote::VirtualRemote;

/// Level reported by the demo `brightness` sensor until changed.
pub const DEFAULT_BRIGHTNESS: f64 = 1000.0;

/// In-memory handle registry over simulated devices.
#[derive(Debug, Clone)]
pub struct VirtualBoard {
    sensors: BTreeMap<CapabilityName, VirtualSensor>,
    actuators: BTreeMap<CapabilityName, VirtualActuator>,
}

impl Default for VirtualBoard {
    fn default() -> Self {
        Self::empty()
            .with_sensor("brightness", DEFAULT_BRIGHTNESS)
            .with_sensor("sound", 0.0)
            .with_actuator("buzzer")
            .with_actuator("led")
    }
}

impl VirtualBoard {
    /// A board with no capabilities.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sensors: BTreeMap::new(),
            actuators: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_sensor(mut self, name: impl Into<CapabilityName>, level: f64) -> Self {
        self.sensors.insert(name.into(), VirtualSensor::new(level));
        self
    }

    #[must_use]
    pub fn with_actuator(mut self, name: impl Into<CapabilityName>) -> Self {
        self.actuators
            .insert(name.into(), VirtualActuator::default());
        self
    }

    /// A handle sharing state with the board's sensor.
    #[must_use]
    pub fn sensor_handle(&self, name: &str) -> Option<&VirtualSensor> {
        self.sensors.get(name)
    }

    /// A handle sharing state with the board's actuator.
    #[must_use]
    pub fn actuator_handle(&self, name: &str) -> Option<&VirtualActuator> {
        self.actuators.get(name)
    }

    /// Set the level a sensor reports.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCapabilityError`] if the board has no such sensor.
    pub fn set_level(&self, name: &str, level: f64) -> Result<(), UnknownCapabilityError> {
        let sensor = self
            .sensors
            .get(name)
            .ok_or_else(|| unknown(name, CapabilityKind::Sensor))?;
        sensor.set_level(level);
        tracing::debug!(sensor = name, level, "virtual sensor level set");
        Ok(())
    }

    pub fn sensor_names(&self) -> impl Iterator<Item = &CapabilityName> {
        self.sensors.keys()
    }

    pub fn actuator_names(&self) -> impl Iterator<Item = &CapabilityName> {
        self.actuators.keys()
    }
}

fn unknown(name: &str, kind: CapabilityKind) -> UnknownCapabilityError {
    UnknownCapabilityError {
        name: CapabilityName::new(name),
        kind,
    }
}

impl HandleRegistry for VirtualBoard {
    type Sensor = VirtualSensor;
    type Actuator = VirtualActuator;

    fn sensor(&self, name: &CapabilityName) -> Result<VirtualSensor, UnknownCapabilityError> {
        self.sensors
            .get(name)
            .cloned()
            .ok_or_else(|| unknown(name.as_str(), CapabilityKind::Sensor))
    }

    fn actuator(&self, name: &CapabilityName) -> Result<VirtualActuator, UnknownCapabilityError> {
        self.actuators
            .get(name)
            .cloned()
            .ok_or_else(|| unknown(name.as_str(), CapabilityKind::Actuator))
    }
}
