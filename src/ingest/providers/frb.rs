// src/ingest/providers/frb.rs
use std::path::PathBuf;

use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use crate::ingest::error::FetchError;
use crate::ingest::fetch::{Expect, SourceLocation, SourceReader};
use crate::ingest::fields::{numeric, FieldChain};
use crate::ingest::payload::entries;
use crate::ingest::types::{EventKind, Level, NormalizedEvent, SourceProvider};

/// Only the newest handful of bursts is shown.
pub const MAX_ITEMS: usize = 5;

const TIME: FieldChain = FieldChain::new(&["date", "detected", "time", "utc", "datetime", "timestamp"]);
const INTENSITY: FieldChain = FieldChain::new(&["fluence", "signal", "snr"]);
const FLUENCE: FieldChain = FieldChain::new(&["fluence"]);
const URL: FieldChain = FieldChain::new(&["url", "link"]);

/// Fluence thresholds, highest first.
pub fn level_for_fluence(fluence: Option<f64>) -> Level {
    match fluence {
        None => Level::Grey,
        Some(f) if f > 100.0 => Level::Red,
        Some(f) if f > 20.0 => Level::Orange,
        Some(f) if f >= 5.0 => Level::Yellow,
        Some(f) if f >= 1.0 => Level::Green,
        Some(_) => Level::Blue,
    }
}

/// Accepted shapes: a bare list, `{"events": ..}`, `{"voevents": ..}`,
/// or an object whose values are the bursts.
fn burst_items(root: &Value) -> Result<Vec<&Value>, FetchError> {
    match root {
        Value::Array(_) => Ok(entries(root)),
        Value::Object(map) => {
            let wrapped = ["events", "voevents"]
                .iter()
                .find_map(|k| map.get(*k).filter(|v| v.is_array() || v.is_object()));
            Ok(entries(wrapped.unwrap_or(root)))
        }
        _ => Err(FetchError::Shape),
    }
}

pub fn parse_bursts(body: &str) -> Result<Vec<NormalizedEvent>, FetchError> {
    let root: Value = serde_json::from_str(body)?;
    let out = burst_items(&root)?
        .into_iter()
        .take(MAX_ITEMS)
        .map(|item| {
            let fluence = FLUENCE.resolve_value(item).and_then(numeric);
            NormalizedEvent::new(
                EventKind::Frb,
                TIME.resolve(item).unwrap_or_default(),
                INTENSITY.resolve(item).unwrap_or_default(),
                level_for_fluence(fluence),
            )
            .with_url(URL.resolve(item))
        })
        .collect();
    Ok(out)
}

/// Marker row shown when no FRB data could be obtained at all.
pub fn offline_event() -> NormalizedEvent {
    NormalizedEvent::new(
        EventKind::FrbOffline,
        chrono::Utc::now().to_rfc3339(),
        "offline".to_string(),
        Level::Grey,
    )
}

/// Primary URL -> backup URL -> bundled sample -> offline placeholder.
pub struct FrbProvider {
    reader: SourceReader,
    primary: Option<SourceLocation>,
    backup: Option<SourceLocation>,
    sample: PathBuf,
}

impl FrbProvider {
    pub fn new(
        reader: SourceReader,
        primary: Option<SourceLocation>,
        backup: Option<SourceLocation>,
        sample: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reader,
            primary,
            backup,
            sample: sample.into(),
        }
    }

    async fn fetch_from(&self, loc: &SourceLocation) -> Result<Vec<NormalizedEvent>, FetchError> {
        let body = self.reader.read(loc, Expect::Json).await?;
        parse_bursts(&body)
    }

    async fn fetch_sample(&self) -> Result<Vec<NormalizedEvent>, FetchError> {
        let body = self.reader.read_local(&self.sample).await?;
        parse_bursts(&body)
    }
}

fn record_failure(stage: &'static str, err: &FetchError) {
    tracing::warn!(target: "dss", source = "frb", stage, kind = err.kind(), error = %err, "frb stage failed");
    counter!("dss_provider_errors_total", "source" => "frb", "kind" => err.kind()).increment(1);
}

#[async_trait]
impl SourceProvider for FrbProvider {
    async fn fetch_events(&self) -> Vec<NormalizedEvent> {
        let remote = [("primary", &self.primary), ("backup", &self.backup)];
        for (stage, loc) in remote {
            let Some(loc) = loc else { continue };
            match self.fetch_from(loc).await {
                Ok(events) => {
                    tracing::info!(target: "dss", source = "frb", stage, count = events.len(), "frb events fetched");
                    return events;
                }
                Err(e) => record_failure(stage, &e),
            }
        }

        counter!("dss_fallback_total", "source" => "frb", "stage" => "sample").increment(1);
        match self.fetch_sample().await {
            Ok(events) => {
                tracing::info!(target: "dss", source = "frb", count = events.len(), "using bundled frb sample");
                events
            }
            Err(e) => {
                record_failure("sample", &e);
                counter!("dss_fallback_total", "source" => "frb", "stage" => "offline").increment(1);
                vec![offline_event()]
            }
        }
    }

    fn name(&self) -> &'static str {
        "frb"
    }
}
