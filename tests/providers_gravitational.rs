// tests/providers_gravitational.rs
mod common;

use deep_space_signals::ingest::fetch::{DataPaths, SourceLocation, SourceReader};
use deep_space_signals::ingest::providers::gravitational::GravitationalProvider;
use deep_space_signals::ingest::types::{EventKind, Level, SourceProvider};

const CATALOG: &str = include_str!("fixtures/gwosc_allevents.json");

fn provider(url: String) -> GravitationalProvider {
    GravitationalProvider::new(
        SourceReader::new(reqwest::Client::new(), DataPaths::default()),
        SourceLocation::parse(&url),
    )
}

#[tokio::test]
async fn gwosc_fixture_normalizes_every_entry() {
    let base = common::spawn_feed(vec![("/allevents", 200, "application/json", CATALOG)]).await;
    let out = provider(format!("{base}/allevents")).fetch_events().await;

    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|e| e.kind == EventKind::GravitationalWave));

    assert_eq!(out[0].time, "1126259462.4");
    assert_eq!(out[0].intensity, "1e-7");
    assert_eq!(out[0].level, Level::Yellow);
    assert!(out[0].url.as_deref().unwrap().contains("GW150914"));

    assert_eq!(out[1].intensity, "0.99");
    assert_eq!(out[1].level, Level::Red);

    // nothing usable: placeholders, removed later by the filter
    assert_eq!(out[2].time, "No time");
    assert_eq!(out[2].intensity, "No intensity");
    assert_eq!(out[2].url.as_deref(), Some("#"));
}

#[tokio::test]
async fn failures_degrade_to_empty() {
    let base = common::spawn_feed(vec![
        ("/html", 200, "text/html", "<html></html>"),
        ("/err", 502, "application/json", "{}"),
        ("/bad", 200, "application/json", "{\"events\": "),
    ])
    .await;
    for path in ["html", "err", "bad"] {
        let out = provider(format!("{base}/{path}")).fetch_events().await;
        assert!(out.is_empty(), "{path} should yield nothing");
    }
    assert!(provider("http://127.0.0.1:9/x".into()).fetch_events().await.is_empty());
}
