//! Deep Space Signals: binary entrypoint.
//! Loads configuration, arms the fetch scheduler and serves the snapshot over Axum.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use deep_space_signals::api::{self, AppState};
use deep_space_signals::config::DeepSpaceConfig;
use deep_space_signals::delivery::{SinkMux, SnapshotStore};
use deep_space_signals::ingest::scheduler::FetchScheduler;
use deep_space_signals::metrics::Metrics;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    deep_space_signals::init_tracing();

    let cfg = DeepSpaceConfig::load_default().context("loading configuration")?;
    let metrics = Metrics::init(&cfg)?;

    let store = SnapshotStore::new();
    let sinks = SinkMux::from_env(store.clone());
    tracing::info!(target: "dss", sinks = sinks.len(), "delivery sinks ready");

    let scheduler = Arc::new(FetchScheduler::new(Arc::new(sinks)));
    scheduler.configure(cfg).context("arming scheduler")?;

    let router = api::router(AppState { scheduler, store }).merge(metrics.router());

    Ok(router.into())
}
