//! Fixtures shared by the handler tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use actiflow_adapter_virtual::{VirtualBoard, VirtualRemote};
use actiflow_app::event_bus::InProcessEventBus;
use actiflow_app::executor::Instance;
use actiflow_app::runner::{self, DEFAULT_QUEUE_CAPACITY};
use actiflow_app::sampling::Sampler;
use actiflow_domain::comparison::Comparison;
use actiflow_domain::graph::{Activity, ActivityGraph};
use actiflow_domain::remote::Method;

use crate::state::AppState;

/// `start` turns the led off and watches for dusk, `on` lights it and
/// waits for `PUT "off"`.
pub(crate) fn light_switch() -> (AppState, VirtualBoard) {
    let graph = ActivityGraph::builder()
        .name("light switch")
        .activity(Activity::new("start").write("led", 0.0).await_threshold(
            "brightness",
            Comparison::Lt,
            900.0,
            "on",
        ))
        .activity(
            Activity::new("on")
                .write("led", 1.0)
                .await_event("off", Method::Put, "off"),
        )
        .activity(Activity::new("off").write("led", 0.0))
        .build()
        .unwrap();
    let board = VirtualBoard::default();
    let bus = Arc::new(InProcessEventBus::new(64));
    let instance = Instance::new(
        graph,
        &board,
        VirtualRemote::default(),
        Arc::clone(&bus),
        Sampler::new(Duration::from_millis(10)),
    )
    .unwrap();
    let handle = runner::spawn(instance, DEFAULT_QUEUE_CAPACITY);
    (AppState::new(handle, bus), board)
}

/// Send one request and decode the JSON body (`Null` when empty, `String`
/// when the body is not JSON, e.g. axum's plain-text extractor rejections).
pub(crate) async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub(crate) fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
