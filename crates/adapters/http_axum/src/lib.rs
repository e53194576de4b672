//! # actiflow-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Act as the **inbound remote transport**: a request to
//!   `/api/events/{name}` becomes the `(name, method)` event the instance
//!   may be waiting for
//! - Let external feeds inject sensor readings and register cancellation
//!   handlers
//! - Expose the instance's settled state and a live SSE stream of engine
//!   events
//!
//! Every request is turned into an input on the instance's queue; handlers
//! never touch the instance directly, so HTTP concurrency cannot break the
//! one-input-at-a-time rule.
//!
//! ## Dependency rule
//! Depends on `actiflow-app` (runner handle, event bus) and
//! `actiflow-domain` (request/response types). Never leaks axum types into
//! the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
