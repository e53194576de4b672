//! # actiflow-domain
//!
//! Pure domain model for the actiflow automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions
//! - Define **Capabilities** (named sensors and actuators on the device)
//! - Define **Activity graphs** (activities, steps, edges, suspension points)
//! - Define **Sample results** (aggregate statistics over a time window)
//! - Define the **Instance state machine** vocabulary (states, watches, waits, faults)
//! - Define **Events** (observability records of instance transitions)
//! - Contain all invariant enforcement for graph definitions
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod capability;
pub mod comparison;
pub mod event;
pub mod graph;
pub mod instance;
pub mod remote;
pub mod sample;
