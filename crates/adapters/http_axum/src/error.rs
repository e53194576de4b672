//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use actiflow_domain::error::ActiflowError;
use actiflow_domain::remote::UnsupportedMethod;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps engine errors to an HTTP response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Engine(ActiflowError),
    Method(UnsupportedMethod),
}

impl From<ActiflowError> for ApiError {
    fn from(err: ActiflowError) -> Self {
        Self::Engine(err)
    }
}

impl From<UnsupportedMethod> for ApiError {
    fn from(err: UnsupportedMethod) -> Self {
        Self::Method(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Method(err) => (StatusCode::METHOD_NOT_ALLOWED, err.to_string()),
            Self::Engine(err) => match err {
                ActiflowError::Validation(_) | ActiflowError::Definition(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                ActiflowError::UnknownCapability(_) => (StatusCode::NOT_FOUND, err.to_string()),
                ActiflowError::InstanceClosed => (StatusCode::CONFLICT, err.to_string()),
            },
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
