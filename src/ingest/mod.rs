// src/ingest/mod.rs
pub mod error;
pub mod fetch;
pub mod fields;
pub mod payload;
pub mod producer;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::config::DeepSpaceConfig;
use crate::ingest::fetch::{DataPaths, SourceLocation, SourceReader};
use crate::ingest::fields::{NO_INTENSITY, NO_TIME};
use crate::ingest::producer::{producer_for, CommandProducer};
use crate::ingest::providers::{
    apod::ApodProvider, frb::FrbProvider, gravitational::GravitationalProvider,
    pulsar::PulsarProvider,
};
use crate::ingest::types::{EventSet, NormalizedEvent, SourceProvider};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("dss_cycles_total", "Completed fetch cycles.");
        describe_counter!(
            "dss_cycles_skipped_total",
            "Cycles skipped because the previous one was still running."
        );
        describe_counter!("dss_events_total", "Events delivered, per source.");
        describe_counter!(
            "dss_filtered_total",
            "Events dropped for missing fields or below minStrength."
        );
        describe_counter!(
            "dss_provider_errors_total",
            "Adapter failures by source and kind."
        );
        describe_counter!("dss_fallback_total", "FRB fallback stages taken.");
        describe_histogram!("dss_cycle_ms", "Cycle wall time in milliseconds.");
        describe_gauge!("dss_last_cycle_ts", "Unix ts of the last completed cycle.");
    });
}

/// Drop events that cannot be shown: empty or placeholder `time` / `intensity`.
/// `type` is a closed enum, so it is always present.
pub fn filter_events(events: Vec<NormalizedEvent>) -> Vec<NormalizedEvent> {
    events
        .into_iter()
        .filter(|ev| {
            let time = ev.time.trim();
            let intensity = ev.intensity.trim();
            !time.is_empty() && time != NO_TIME && !intensity.is_empty() && intensity != NO_INTENSITY
        })
        .collect()
}

/// Per-source minimum intensity. Only numeric intensities are compared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinStrength(BTreeMap<String, f64>);

impl MinStrength {
    pub fn from_config(raw: &BTreeMap<String, Option<f64>>) -> Self {
        Self(
            raw.iter()
                .filter_map(|(k, v)| v.map(|t| (k.clone(), t)))
                .collect(),
        )
    }

    pub fn admits(&self, ev: &NormalizedEvent) -> bool {
        let Some(threshold) = self.0.get(ev.kind.source_key()) else {
            return true;
        };
        match ev.intensity.trim().parse::<f64>() {
            Ok(v) => v >= *threshold,
            Err(_) => true,
        }
    }

    pub fn apply(&self, events: Vec<NormalizedEvent>) -> Vec<NormalizedEvent> {
        if self.0.is_empty() {
            return events;
        }
        events.into_iter().filter(|ev| self.admits(ev)).collect()
    }
}

/// Concatenate adapter outputs in source order, filter, and attach the picture of the day.
pub fn assemble(
    lists: Vec<Vec<NormalizedEvent>>,
    picture_of_day: Option<NormalizedEvent>,
    min_strength: &MinStrength,
) -> EventSet {
    let merged: Vec<NormalizedEvent> = lists.into_iter().flatten().collect();
    let before = merged.len();
    let events = min_strength.apply(filter_events(merged));
    let dropped = before - events.len();
    if dropped > 0 {
        counter!("dss_filtered_total").increment(dropped as u64);
    }
    EventSet {
        events,
        picture_of_day,
    }
}

/// The enabled adapters of one configuration.
pub struct Pipeline {
    providers: Vec<Box<dyn SourceProvider>>,
    picture_of_day: Option<Box<dyn SourceProvider>>,
    min_strength: MinStrength,
}

impl Pipeline {
    /// `providers` must already be in delivery order (FRB, GW, pulsar).
    pub fn new(
        providers: Vec<Box<dyn SourceProvider>>,
        picture_of_day: Option<Box<dyn SourceProvider>>,
        min_strength: MinStrength,
    ) -> Self {
        Self {
            providers,
            picture_of_day,
            min_strength,
        }
    }

    pub fn from_config(cfg: &DeepSpaceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("deep-space-signals/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .context("building http client")?;
        let reader = SourceReader::new(client, DataPaths::new(cfg.data_dir.clone()));
        let urls = &cfg.api_urls;
        let loc = |raw: &Option<String>| {
            raw.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(SourceLocation::parse)
        };

        let mut providers: Vec<Box<dyn SourceProvider>> = Vec::new();
        if cfg.sources.frb {
            providers.push(Box::new(FrbProvider::new(
                reader.clone(),
                loc(&urls.frb),
                loc(&urls.frb_backup),
                cfg.frb_sample.clone(),
            )));
        }
        if cfg.sources.gravitational {
            match loc(&urls.gravitational) {
                Some(l) => providers.push(Box::new(GravitationalProvider::new(reader.clone(), l))),
                None => tracing::warn!(target: "dss", source = "gravitational", "enabled without url"),
            }
        }
        if cfg.sources.pulsar {
            match loc(&urls.pulsar) {
                Some(l) => {
                    let generator = CommandProducer::new(
                        cfg.pulsar_generator.program.clone(),
                        cfg.pulsar_generator.args.clone(),
                    );
                    let producer = producer_for(
                        &l,
                        &reader,
                        &cfg.script_interpreter,
                        Some(generator),
                        Duration::from_millis(cfg.producer_timeout_ms),
                    );
                    providers.push(Box::new(PulsarProvider::new(producer)));
                }
                None => tracing::warn!(target: "dss", source = "pulsar", "enabled without url"),
            }
        }

        let picture_of_day = if cfg.sources.apod {
            loc(&urls.apod).map(|l| -> Box<dyn SourceProvider> {
                Box::new(ApodProvider::new(reader.clone(), l))
            })
        } else {
            None
        };

        Ok(Self::new(
            providers,
            picture_of_day,
            MinStrength::from_config(&cfg.min_strength),
        ))
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .chain(self.picture_of_day.iter())
            .map(|p| p.name())
            .collect()
    }

    /// Run every enabled adapter concurrently and build the snapshot.
    pub async fn run_cycle(&self) -> EventSet {
        ensure_metrics_described();
        let t0 = std::time::Instant::now();

        let lists = join_all(self.providers.iter().map(|p| p.fetch_events()));
        let picture = async {
            match &self.picture_of_day {
                Some(p) => p.fetch_events().await.into_iter().next(),
                None => None,
            }
        };
        let (lists, picture) = tokio::join!(lists, picture);

        for (p, list) in self.providers.iter().zip(&lists) {
            counter!("dss_events_total", "source" => p.name()).increment(list.len() as u64);
        }
        let set = assemble(lists, picture, &self.min_strength);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("dss_cycle_ms").record(ms);
        counter!("dss_cycles_total").increment(1);
        gauge!("dss_last_cycle_ts").set(chrono::Utc::now().timestamp() as f64);
        tracing::info!(
            target: "dss",
            events = set.events.len(),
            apod = set.picture_of_day.is_some(),
            elapsed_ms = ms as u64,
            "fetch cycle complete"
        );
        set
    }
}
