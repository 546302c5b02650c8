// src/lib.rs
// Public library surface for the server binary, the one-shot CLI and integration tests.

pub mod api;
pub mod config;
pub mod delivery;
pub mod ingest;
pub mod metrics;

pub use crate::api::router;
pub use crate::config::DeepSpaceConfig;
pub use crate::ingest::types::{EventKind, EventSet, Level, NormalizedEvent};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the tracing subscriber unless the host already did.
/// `RUST_LOG` overrides the default filter; `DSS_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dss=info,warn"));
    let json = std::env::var("DSS_LOG_JSON").ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
