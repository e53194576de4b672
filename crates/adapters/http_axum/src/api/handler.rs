//! Explicit cancellation-handler registration.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use actiflow_domain::graph::CancellationWait;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the register endpoint.
pub enum RegisterResponse {
    Accepted,
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `POST /api/handler`
///
/// Replaces the pending cancellation registration. The instance ignores it
/// unless it is suspended on a cancellation wait.
pub async fn register(
    State(state): State<AppState>,
    Json(wait): Json<CancellationWait>,
) -> Result<RegisterResponse, ApiError> {
    tracing::debug!(wait = %wait, "handler registration received");
    state.instance.register_handler(wait).await?;
    Ok(RegisterResponse::Accepted)
}
