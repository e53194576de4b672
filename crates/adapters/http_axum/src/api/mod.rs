//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod handler;
#[allow(clippy::missing_errors_doc)]
pub mod instance;
#[allow(clippy::missing_errors_doc)]
pub mod sensors;
pub mod sse;

use axum::Router;
use axum::routing::{any, get, post};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Instance
        .route("/instance", get(instance::get))
        .route("/instance/start", post(instance::start))
        // Inbound remote events
        .route("/events/{name}", any(events::deliver))
        // Readings and registrations
        .route("/sensors/{name}/readings", post(sensors::deliver_reading))
        .route("/handler", post(handler::register))
        // Live engine events
        .route("/stream", get(sse::stream))
}
