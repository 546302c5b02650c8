// src/ingest/providers/pulsar.rs
use std::collections::BTreeMap;

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ingest::error::FetchError;
use crate::ingest::fields::{FieldChain, NO_INTENSITY, NO_TIME};
use crate::ingest::payload::{entries, from_xml, sniff, Payload};
use crate::ingest::producer::RawProducer;
use crate::ingest::types::{EventKind, Level, NormalizedEvent, SourceProvider};

const TIME: FieldChain = FieldChain::new(&[
    "time",
    "observationTime",
    "observation_time",
    "PEPOCH",
    "epoch",
    "date",
]);
const INTENSITY: FieldChain = FieldChain::new(&["intensity", "period", "P0", "snr", "SNR", "signal"]);
const URL: FieldChain = FieldChain::new(&["url", "link", "href"]);

const JSON_WRAPPERS: [&str; 3] = ["records", "items", "data"];

fn json_records(root: &Value) -> Vec<&Value> {
    if root.is_array() {
        return entries(root);
    }
    for key in JSON_WRAPPERS {
        if let Some(inner) = root.get(key) {
            // `{"records": {"record": [...]}}` mirrors the XML layout
            return match inner.get("record") {
                Some(rec) => entries(rec),
                None if inner.is_array() => entries(inner),
                None => Vec::new(),
            };
        }
    }
    Vec::new()
}

/// `<records><record>...</record></records>`. Fields may be child elements or
/// attributes of `<record>`.
#[derive(Debug, Deserialize)]
struct XmlRecords {
    #[serde(rename = "record", default)]
    record: Vec<BTreeMap<String, String>>,
}

fn xml_records(body: &str) -> Result<Vec<Value>, FetchError> {
    let doc: XmlRecords = from_xml(body)?;
    Ok(doc
        .record
        .into_iter()
        .map(|fields| {
            let map: Map<String, Value> = fields
                .into_iter()
                .map(|(k, v)| (k.trim_start_matches('@').to_string(), Value::String(v)))
                .collect();
            Value::Object(map)
        })
        .collect())
}

fn to_event(rec: &Value) -> NormalizedEvent {
    NormalizedEvent::new(
        EventKind::Pulsar,
        TIME.resolve_or(rec, NO_TIME),
        INTENSITY.resolve_or(rec, NO_INTENSITY),
        Level::Green,
    )
    .with_url(URL.resolve(rec))
}

/// Parse a pulsar payload of either format.
pub fn parse_records(raw: &str) -> Result<Vec<NormalizedEvent>, FetchError> {
    let records: Vec<Value> = match sniff(raw)? {
        Payload::Json(root) => json_records(&root).into_iter().cloned().collect(),
        Payload::Xml(body) => xml_records(&body)?,
    };
    Ok(records
        .iter()
        .filter(|r| r.is_object())
        .map(to_event)
        .collect())
}

pub struct PulsarProvider {
    producer: Box<dyn RawProducer>,
}

impl PulsarProvider {
    pub fn new(producer: Box<dyn RawProducer>) -> Self {
        Self { producer }
    }

    async fn try_fetch(&self) -> Result<Vec<NormalizedEvent>, FetchError> {
        let raw = self.producer.produce().await?;
        parse_records(&raw)
    }
}

#[async_trait]
impl SourceProvider for PulsarProvider {
    async fn fetch_events(&self) -> Vec<NormalizedEvent> {
        match self.try_fetch().await {
            Ok(events) => {
                tracing::info!(target: "dss", source = "pulsar", count = events.len(), "pulsar records fetched");
                events
            }
            Err(e) => {
                tracing::warn!(
                    target: "dss",
                    source = "pulsar",
                    producer = %self.producer.describe(),
                    kind = e.kind(),
                    error = %e,
                    "pulsar fetch failed"
                );
                counter!("dss_provider_errors_total", "source" => "pulsar", "kind" => e.kind())
                    .increment(1);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "pulsar"
    }
}
