//! Instance state and lifecycle handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use actiflow_domain::id::InstanceId;
use actiflow_domain::instance::InstanceState;

use crate::error::ApiError;
use crate::state::AppState;

/// Snapshot of the instance as last settled.
#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub id: InstanceId,
    pub status: InstanceState,
    pub finished: bool,
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<InstanceView>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the start endpoint.
pub enum StartResponse {
    Accepted,
}

impl IntoResponse for StartResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `GET /api/instance`
pub async fn get(State(state): State<AppState>) -> GetResponse {
    let status = state.instance.state();
    GetResponse::Ok(Json(InstanceView {
        id: state.instance.id(),
        finished: status.is_finished(),
        status,
    }))
}

/// `POST /api/instance/start`
///
/// Queues `Start`; an instance that already left `Idle` ignores it.
pub async fn start(State(state): State<AppState>) -> Result<StartResponse, ApiError> {
    state.instance.start().await?;
    Ok(StartResponse::Accepted)
}
