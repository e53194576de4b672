//! Reading injection for sensors fed from outside the daemon.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a delivered reading.
#[derive(Debug, Deserialize)]
pub struct ReadingRequest {
    pub value: f64,
}

/// Possible responses from the deliver-reading endpoint.
pub enum DeliverReadingResponse {
    Accepted,
}

impl IntoResponse for DeliverReadingResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `POST /api/sensors/{name}/readings`
pub async fn deliver_reading(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<ReadingRequest>,
) -> Result<DeliverReadingResponse, ApiError> {
    tracing::debug!(sensor = %name, value = body.value, "reading received");
    state.instance.deliver_reading(name, body.value).await?;
    Ok(DeliverReadingResponse::Accepted)
}
