//! Handle registry port — symbolic capability lookup.

use actiflow_domain::capability::CapabilityKind;
use actiflow_domain::error::UnknownCapabilityError;
use actiflow_domain::id::CapabilityName;

use super::device::{Actuator, Sensor};

/// A resolved capability of either kind.
#[derive(Debug, Clone)]
pub enum Capability<S, A> {
    Sensor(S),
    Actuator(A),
}

impl<S, A> Capability<S, A> {
    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::Sensor(_) => CapabilityKind::Sensor,
            Self::Actuator(_) => CapabilityKind::Actuator,
        }
    }
}

/// Resolves capability names to handles.
///
/// The registry is read-only from the engine's point of view. Handles it
/// returns must stay valid for as long as the caller holds them; mutual
/// exclusion across instances sharing the same hardware is the
/// implementation's concern.
pub trait HandleRegistry {
    type Sensor: Sensor + 'static;
    type Actuator: Actuator + 'static;

    /// Look up a sensor by name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCapabilityError`] if no sensor has that name.
    fn sensor(&self, name: &CapabilityName) -> Result<Self::Sensor, UnknownCapabilityError>;

    /// Look up an actuator by name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCapabilityError`] if no actuator has that name.
    fn actuator(&self, name: &CapabilityName) -> Result<Self::Actuator, UnknownCapabilityError>;

    /// Look up a capability of either kind. Sensors take precedence.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCapabilityError`] if the name is not registered at all.
    fn resolve(
        &self,
        name: &CapabilityName,
    ) -> Result<Capability<Self::Sensor, Self::Actuator>, UnknownCapabilityError> {
        if let Ok(sensor) = self.sensor(name) {
            return Ok(Capability::Sensor(sensor));
        }
        self.actuator(name).map(Capability::Actuator)
    }
}
