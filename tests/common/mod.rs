// tests/common/mod.rs
//! In-process upstream feeds: an Axum router bound to 127.0.0.1:0.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::{header, StatusCode},
    routing::get,
    Router,
};
use deep_space_signals::ingest::types::{NormalizedEvent, SourceProvider};

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve upstream");
    });
    format!("http://{addr}")
}

/// A feed with one route per `(path, status, content-type, body)`.
pub async fn spawn_feed(routes: Vec<(&'static str, u16, &'static str, &'static str)>) -> String {
    let mut router = Router::new();
    for (path, status, ctype, body) in routes {
        let status = StatusCode::from_u16(status).expect("status");
        router = router.route(
            path,
            get(move || async move { (status, [(header::CONTENT_TYPE, ctype)], body) }),
        );
    }
    spawn_upstream(router).await
}

/// Fixed events, counting how often it was asked.
pub struct StaticProvider {
    pub name: &'static str,
    pub events: Vec<NormalizedEvent>,
    pub calls: Arc<AtomicUsize>,
    pub delay_ms: u64,
}

impl StaticProvider {
    pub fn new(name: &'static str, events: Vec<NormalizedEvent>) -> Self {
        Self {
            name,
            events,
            calls: Arc::new(AtomicUsize::new(0)),
            delay_ms: 0,
        }
    }

    pub fn slow(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

#[async_trait]
impl SourceProvider for StaticProvider {
    async fn fetch_events(&self) -> Vec<NormalizedEvent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.events.clone()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
