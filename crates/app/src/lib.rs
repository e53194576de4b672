//! # actiflow-app
//!
//! Application layer — the engine core and its **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Sensor` / `Actuator` — capability handles
//!   - `HandleRegistry` — resolve symbolic names to handles
//!   - `RemoteChannel` — best-effort outbound requests
//!   - `EventPublisher` — observability events
//! - Provide the engine itself:
//!   - `Sampler` — time-bounded reads aggregated into a sample result
//!   - `Instance` — the activity graph executor and its state machine
//!   - `runner` — per-instance single-consumer input queue
//!   - `poller` — feeds sensor readings into a running instance
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `actiflow-domain` only (plus `tokio` for channels, timers and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod executor;
pub mod handler_slot;
pub mod poller;
pub mod ports;
pub mod runner;
pub mod sampling;
