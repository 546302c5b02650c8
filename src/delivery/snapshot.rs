// src/delivery/snapshot.rs
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;

use super::EventSink;
use crate::ingest::types::EventSet;

/// The single in-memory snapshot. `None` until the first cycle completes.
#[derive(Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<Option<Arc<EventSet>>>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn latest(&self) -> Option<Arc<EventSet>> {
        self.tx.borrow().clone()
    }

    /// Replace the snapshot wholesale.
    pub fn replace(&self, set: EventSet) {
        self.tx.send_replace(Some(Arc::new(set)));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<EventSet>>> {
        self.tx.subscribe()
    }
}

#[async_trait::async_trait]
impl EventSink for SnapshotStore {
    async fn deliver(&self, set: &EventSet) -> Result<()> {
        self.replace(set.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}
