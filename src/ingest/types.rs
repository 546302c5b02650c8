// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// Source tag carried by every event. Wire strings are what the dashboard renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "FRB")]
    Frb,
    /// Synthetic placeholder when every FRB fallback is exhausted.
    #[serde(rename = "FRB (offline)")]
    FrbOffline,
    #[serde(rename = "GW")]
    GravitationalWave,
    #[serde(rename = "Pulsar")]
    Pulsar,
    #[serde(rename = "APOD")]
    PictureOfDay,
}

impl EventKind {
    /// Config/metrics key of the source that produces this kind.
    pub fn source_key(self) -> &'static str {
        match self {
            EventKind::Frb | EventKind::FrbOffline => "frb",
            EventKind::GravitationalWave => "gravitational",
            EventKind::Pulsar => "pulsar",
            EventKind::PictureOfDay => "apod",
        }
    }
}

/// Severity/color tag. Each adapter derives it with its own rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Grey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub time: String,      // source-supplied, never reparsed
    pub intensity: String, // fluence, significance, period or title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NormalizedEvent {
    pub fn new(kind: EventKind, time: String, intensity: String, level: Level) -> Self {
        Self {
            kind,
            time,
            intensity,
            url: None,
            level,
            media_type: None,
            description: None,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }
}

/// Per-cycle snapshot. Replaced wholesale, never merged with a previous cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSet {
    pub events: Vec<NormalizedEvent>,
    #[serde(rename = "apod")]
    pub picture_of_day: Option<NormalizedEvent>,
}

/// One source adapter. Never fails: all errors degrade to an empty (or fallback) result.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_events(&self) -> Vec<NormalizedEvent>;
    fn name(&self) -> &'static str;
}
