//! Virtual device implementations — scripted sensors, recording actuators.
//!
//! Handles are cheap clones sharing one state, so a test or the daemon can
//! keep a handle to drive or inspect a device the engine also holds.

mod actuator;
mod sensor;

pub use actuator::VirtualActuator;
pub use sensor::VirtualSensor;
