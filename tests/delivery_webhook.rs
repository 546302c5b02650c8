// tests/delivery_webhook.rs
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use deep_space_signals::delivery::{EventSink, WebhookSink};
use deep_space_signals::{EventKind, EventSet, Level, NormalizedEvent};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Clone, Default)]
struct Received {
    bodies: Arc<Mutex<Vec<Value>>>,
    hits: Arc<AtomicUsize>,
}

async fn flaky(State(rx): State<Received>, Json(body): Json<Value>) -> StatusCode {
    // first attempt fails, retries succeed
    if rx.hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    rx.bodies.lock().push(body);
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn webhook_posts_events_and_apod_with_retry() {
    let rx = Received::default();
    let base = common::spawn_upstream(
        Router::new()
            .route("/hook", post(flaky))
            .with_state(rx.clone()),
    )
    .await;

    let set = EventSet {
        events: vec![NormalizedEvent::new(EventKind::Pulsar, "55000".into(), "0.089".into(), Level::Green)],
        picture_of_day: None,
    };
    let sink = WebhookSink::new(format!("{base}/hook")).with_timeout(2).with_retries(3);
    sink.deliver(&set).await.expect("delivered on retry");

    assert_eq!(rx.hits.load(Ordering::SeqCst), 2);
    let bodies = rx.bodies.lock();
    assert_eq!(bodies[0]["events"][0]["type"], "Pulsar");
    assert!(bodies[0]["apod"].is_null());
}

#[tokio::test]
async fn webhook_gives_up_after_retries() {
    let sink = WebhookSink::new("http://127.0.0.1:9/hook".into()).with_retries(1);
    assert!(sink.deliver(&EventSet::default()).await.is_err());
}
