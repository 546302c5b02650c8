// src/ingest/providers/gravitational.rs
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use crate::ingest::error::FetchError;
use crate::ingest::fetch::{Expect, SourceLocation, SourceReader};
use crate::ingest::fields::{numeric, FieldChain, NO_INTENSITY, NO_TIME, NO_URL};
use crate::ingest::payload::entries;
use crate::ingest::types::{EventKind, Level, NormalizedEvent, SourceProvider};

const TIME: FieldChain = FieldChain::new(&[
    "time",
    "eventTime",
    "event_time",
    "eventDate",
    "event_date",
    "startTime",
    "start_time",
    "GPS",
    "gps",
    "gpsTime",
    "date",
]);
const INTENSITY: FieldChain = FieldChain::new(&[
    "significance",
    "far",
    "FAR",
    "falseAlarmRate",
    "network_matched_filter_snr",
    "snr",
    "SNR",
    "bayesFactor",
    "bayes_factor",
]);
const SIGNIFICANCE: FieldChain = FieldChain::new(&["significance"]);
const URL: FieldChain = FieldChain::new(&["url", "jsonurl", "link", "eventUrl", "event_url"]);

pub fn level_for_significance(significance: Option<f64>) -> Level {
    match significance {
        Some(s) if s > 0.9 => Level::Red,
        _ => Level::Yellow,
    }
}

/// `{"events": {...}}`, `{"events": [...]}`, or the collection itself.
pub fn parse_catalog(body: &str) -> Result<Vec<NormalizedEvent>, FetchError> {
    let root: Value = serde_json::from_str(body)?;
    let collection = root.get("events").unwrap_or(&root);
    if !(collection.is_array() || collection.is_object()) {
        return Err(FetchError::Shape);
    }
    let out = entries(collection)
        .into_iter()
        .filter(|ev| ev.is_object())
        .map(|ev| {
            let significance = SIGNIFICANCE.resolve_value(ev).and_then(numeric);
            NormalizedEvent::new(
                EventKind::GravitationalWave,
                TIME.resolve_or(ev, NO_TIME),
                INTENSITY.resolve_or(ev, NO_INTENSITY),
                level_for_significance(significance),
            )
            .with_url(Some(URL.resolve_or(ev, NO_URL)))
        })
        .collect();
    Ok(out)
}

pub struct GravitationalProvider {
    reader: SourceReader,
    location: SourceLocation,
}

impl GravitationalProvider {
    pub fn new(reader: SourceReader, location: SourceLocation) -> Self {
        Self { reader, location }
    }

    async fn try_fetch(&self) -> Result<Vec<NormalizedEvent>, FetchError> {
        let body = self.reader.read(&self.location, Expect::Json).await?;
        parse_catalog(&body)
    }
}

#[async_trait]
impl SourceProvider for GravitationalProvider {
    async fn fetch_events(&self) -> Vec<NormalizedEvent> {
        match self.try_fetch().await {
            Ok(events) => {
                tracing::info!(target: "dss", source = "gravitational", count = events.len(), "gw events fetched");
                events
            }
            Err(e) => {
                tracing::warn!(target: "dss", source = "gravitational", kind = e.kind(), error = %e, "gw fetch failed");
                counter!("dss_provider_errors_total", "source" => "gravitational", "kind" => e.kind())
                    .increment(1);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "gravitational"
    }
}
