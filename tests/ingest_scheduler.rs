// tests/ingest_scheduler.rs
mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::StaticProvider;
use deep_space_signals::config::DeepSpaceConfig;
use deep_space_signals::delivery::SnapshotStore;
use deep_space_signals::ingest::scheduler::{CycleRunner, FetchScheduler};
use deep_space_signals::ingest::types::SourceProvider;
use deep_space_signals::ingest::{MinStrength, Pipeline};
use deep_space_signals::{EventKind, Level, NormalizedEvent};

fn one_event(name: &'static str) -> StaticProvider {
    StaticProvider::new(
        name,
        vec![NormalizedEvent::new(EventKind::Frb, "t".into(), "7".into(), Level::Yellow)],
    )
}

fn pipeline_of(p: StaticProvider) -> Pipeline {
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(p)];
    Pipeline::new(providers, None, MinStrength::default())
}

fn cfg_every(ms: u64) -> DeepSpaceConfig {
    DeepSpaceConfig {
        update_interval: ms,
        ..Default::default()
    }
}

#[tokio::test]
async fn runs_immediately_then_on_interval() {
    let store = SnapshotStore::new();
    let sched = FetchScheduler::new(Arc::new(store.clone()));
    let p = one_event("frb");
    let calls = p.calls.clone();

    sched.configure_with(cfg_every(100), pipeline_of(p));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "initial fetch on configuration");
    assert_eq!(store.latest().unwrap().events.len(), 1);

    tokio::time::sleep(Duration::from_millis(320)).await;
    assert!(calls.load(Ordering::SeqCst) >= 3);
    // replaced, never appended
    assert_eq!(store.latest().unwrap().events.len(), 1);
    assert!(sched.is_armed());
    sched.stop();
    assert!(!sched.is_armed());
}

#[tokio::test]
async fn reconfigure_cancels_previous_timer() {
    let store = SnapshotStore::new();
    let sched = FetchScheduler::new(Arc::new(store.clone()));

    let old = one_event("frb");
    let old_calls = old.calls.clone();
    sched.configure_with(cfg_every(50), pipeline_of(old));
    tokio::time::sleep(Duration::from_millis(30)).await;

    let new = one_event("frb");
    let new_calls = new.calls.clone();
    sched.configure_with(cfg_every(60_000), pipeline_of(new));
    tokio::time::sleep(Duration::from_millis(30)).await;
    let frozen = old_calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(old_calls.load(Ordering::SeqCst), frozen);
    assert_eq!(new_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sched.config().update_interval, 60_000);
}

#[tokio::test]
async fn overlapping_cycle_is_skipped() {
    let store = SnapshotStore::new();
    let runner = Arc::new(CycleRunner::new(
        pipeline_of(one_event("frb").slow(300)),
        Arc::new(store.clone()),
    ));

    let bg = runner.clone();
    let first = tokio::spawn(async move { bg.run_guarded().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(runner.run_guarded().await.is_none(), "second cycle must not overlap");
    let done = first.await.unwrap();
    assert!(done.is_some());
    assert!(store.latest().is_some());

    // free again once the first settled
    assert!(runner.run_guarded().await.is_some());
}

#[tokio::test]
async fn refresh_without_configuration_is_none() {
    let sched = FetchScheduler::new(Arc::new(SnapshotStore::new()));
    assert!(sched.refresh_now().await.is_none());
}

fn tagged(intensity: &str) -> StaticProvider {
    StaticProvider::new(
        "frb",
        vec![NormalizedEvent::new(EventKind::Frb, "t".into(), intensity.into(), Level::Green)],
    )
}

#[tokio::test]
async fn refresh_from_replaced_configuration_is_discarded() {
    let store = SnapshotStore::new();
    let sched = Arc::new(FetchScheduler::new(Arc::new(store.clone())));

    // let the initial timer cycle settle before starting a slow manual refresh
    let old = tagged("1").slow(300);
    sched.configure_with(cfg_every(60_000), pipeline_of(old));
    tokio::time::sleep(Duration::from_millis(350)).await;

    let bg = sched.clone();
    let stale = tokio::spawn(async move { bg.refresh_now().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    sched.configure_with(cfg_every(60_000), pipeline_of(tagged("2")));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.latest().unwrap().events[0].intensity, "2");

    assert!(stale.await.unwrap().is_none(), "superseded refresh must not report a set");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.latest().unwrap().events[0].intensity, "2");
}

#[tokio::test]
async fn retired_runner_no_longer_runs() {
    let store = SnapshotStore::new();
    let runner = CycleRunner::new(pipeline_of(tagged("1")), Arc::new(store.clone()));
    runner.retire();
    assert!(runner.run_guarded().await.is_none());
    assert!(store.latest().is_none());
}
