// src/delivery/mod.rs
//! Outbound side: where each cycle's `EventSet` goes once it is assembled.

pub mod snapshot;
pub mod webhook;

use std::sync::Arc;

use anyhow::Result;

use crate::ingest::types::EventSet;

pub use snapshot::SnapshotStore;
pub use webhook::WebhookSink;

#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, set: &EventSet) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fans a snapshot out to every sink. One failing sink does not stop the others.
#[derive(Clone, Default)]
pub struct SinkMux {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl SinkMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Snapshot store plus the webhook from `DSS_DELIVERY_WEBHOOK`, if set.
    pub fn from_env(store: SnapshotStore) -> Self {
        let mux = Self::new().with(Arc::new(store));
        match WebhookSink::from_env() {
            Some(hook) => mux.with(Arc::new(hook)),
            None => mux,
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait::async_trait]
impl EventSink for SinkMux {
    async fn deliver(&self, set: &EventSet) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(set).await {
                tracing::warn!(target: "dss", sink = sink.name(), error = %e, "delivery failed");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}
