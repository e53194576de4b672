//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the engine and the outside world.
//! They are defined here (in `app`) so that both the executor and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod device;
pub mod event_bus;
pub mod registry;
pub mod remote;

pub use device::{Actuator, Sensor};
pub use event_bus::EventPublisher;
pub use registry::{Capability, HandleRegistry};
pub use remote::RemoteChannel;
