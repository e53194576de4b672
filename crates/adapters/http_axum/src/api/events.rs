//! Inbound remote events.
//!
//! `/api/events/{name}` is the server side of the remote channel: the HTTP
//! method and the path segment form the [`EventKey`] the instance's
//! cancellation registration is matched against.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{self, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use actiflow_domain::remote::{EventKey, Method};

use crate::error::ApiError;
use crate::state::AppState;

/// Echo of the event that was queued.
#[derive(Debug, Serialize)]
pub struct DeliveredEvent {
    pub event: String,
    pub method: Method,
}

/// Possible responses from the deliver endpoint.
pub enum DeliverResponse {
    Accepted(Json<DeliveredEvent>),
}

impl IntoResponse for DeliverResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `GET|POST|PUT|DELETE /api/events/{name}`
///
/// Queues the event whatever the instance is doing; one nobody waits for
/// is dropped by the instance.
pub async fn deliver(
    State(state): State<AppState>,
    method: http::Method,
    Path(name): Path<String>,
) -> Result<DeliverResponse, ApiError> {
    let method: Method = method.as_str().parse()?;
    let key = EventKey::new(name, method);
    tracing::debug!(event = %key, "remote event received");
    state.instance.deliver_event(key.clone()).await?;
    Ok(DeliverResponse::Accepted(Json(DeliveredEvent {
        event: key.name,
        method: key.method,
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use actiflow_domain::event::EventType;
    use actiflow_domain::instance::InstanceState;
    use actiflow_domain::remote::{EventKey, Method};

    use crate::router;
    use crate::test_support::{call, empty_request, light_switch};

    #[tokio::test]
    async fn should_complete_wait_when_matching_event_arrives() {
        let (state, board) = light_switch();
        let handle = state.instance.clone();
        handle.start().await.unwrap();
        handle.deliver_reading("brightness", 850.0).await.unwrap();
        handle
            .wait_for(|s| matches!(s, InstanceState::SuspendedOnCancel(_)))
            .await
            .unwrap();

        let (status, body) = call(router::build(state), empty_request("PUT", "/api/events/off")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["event"], "off");
        assert_eq!(body["method"], "PUT");
        let finished = handle.wait_until_finished().await.unwrap();
        assert_eq!(finished, InstanceState::Terminal);
        assert_eq!(
            board.actuator_handle("led").unwrap().history(),
            vec![0.0, 1.0, 0.0]
        );
    }

    #[tokio::test]
    async fn should_leave_wait_armed_when_method_differs() {
        let (state, _board) = light_switch();
        let handle = state.instance.clone();
        let mut events = state.event_bus.subscribe();
        handle.start().await.unwrap();
        handle.deliver_reading("brightness", 850.0).await.unwrap();

        let (status, _) = call(
            router::build(state.clone()),
            empty_request("POST", "/api/events/off"),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let (status, _) = call(router::build(state), empty_request("PUT", "/api/events/off")).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        handle.wait_until_finished().await.unwrap();

        let mut fired = Vec::new();
        while let Ok(event) = events.try_recv() {
            if event.event_type == EventType::WaitFired {
                fired.push(event.data["method"].clone());
            }
        }
        assert_eq!(fired, vec![serde_json::json!("PUT")]);
    }

    #[tokio::test]
    async fn should_decode_event_name_from_path() {
        let (state, _board) = light_switch();

        let (status, body) = call(
            router::build(state),
            empty_request("PUT", "/api/events/cancel%20alarm"),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["event"], "cancel alarm");
    }

    #[tokio::test]
    async fn should_reject_unsupported_method() {
        let (state, _board) = light_switch();

        let (status, body) = call(router::build(state), empty_request("PATCH", "/api/events/off")).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body["error"].as_str().unwrap().contains("PATCH"));
    }

    #[tokio::test]
    async fn should_report_conflict_once_instance_finished() {
        let (state, _board) = light_switch();
        let handle = state.instance.clone();
        handle.start().await.unwrap();
        handle.deliver_reading("brightness", 850.0).await.unwrap();
        handle
            .deliver_event(EventKey::new("off", Method::Put))
            .await
            .unwrap();
        handle.wait_until_finished().await.unwrap();
        handle.closed().await;

        let (status, _) = call(router::build(state), empty_request("PUT", "/api/events/off")).await;

        assert_eq!(status, StatusCode::CONFLICT);
    }
}
