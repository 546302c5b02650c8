// src/ingest/scheduler.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use metrics::counter;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::DeepSpaceConfig;
use crate::delivery::EventSink;
use crate::ingest::types::EventSet;
use crate::ingest::Pipeline;

/// Runs cycles of one pipeline, never two at once. A retired runner still
/// finishes a cycle it already started but no longer delivers it.
pub struct CycleRunner {
    pipeline: Pipeline,
    sink: Arc<dyn EventSink>,
    in_flight: tokio::sync::Mutex<()>,
    retired: AtomicBool,
}

impl CycleRunner {
    pub fn new(pipeline: Pipeline, sink: Arc<dyn EventSink>) -> Self {
        Self {
            pipeline,
            sink,
            in_flight: tokio::sync::Mutex::new(()),
            retired: AtomicBool::new(false),
        }
    }

    /// Stop delivering. Cycles still running are discarded when they settle.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Run one cycle and deliver it. Returns `None` when a cycle is already
    /// running or the runner was retired before the cycle settled.
    pub async fn run_guarded(&self) -> Option<EventSet> {
        if self.is_retired() {
            return None;
        }
        let Ok(_permit) = self.in_flight.try_lock() else {
            tracing::warn!(target: "dss", "previous cycle still running, skipping");
            counter!("dss_cycles_skipped_total").increment(1);
            return None;
        };
        let set = self.pipeline.run_cycle().await;
        if self.is_retired() {
            tracing::info!(target: "dss", "configuration replaced mid-cycle, discarding result");
            return None;
        }
        if let Err(e) = self.sink.deliver(&set).await {
            tracing::warn!(target: "dss", error = %e, "delivery failed");
        }
        Some(set)
    }
}

struct Armed {
    config: Arc<DeepSpaceConfig>,
    runner: Option<Arc<CycleRunner>>,
    task: Option<JoinHandle<()>>,
}

/// Fixed-interval timer around a [`CycleRunner`]. Reconfiguring cancels the old
/// timer (and any cycle it is running), retires the old runner so an outstanding
/// `refresh_now` cannot deliver stale data, and re-arms with the new interval.
/// Each configuration gets its own runner, so a cancelled cycle never holds up
/// the first cycle of its replacement.
pub struct FetchScheduler {
    sink: Arc<dyn EventSink>,
    armed: Mutex<Armed>,
}

impl FetchScheduler {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            armed: Mutex::new(Armed {
                config: Arc::new(DeepSpaceConfig::default()),
                runner: None,
                task: None,
            }),
        }
    }

    /// Build the pipeline for `cfg` and (re)start the timer. Must run inside a Tokio runtime.
    pub fn configure(&self, cfg: DeepSpaceConfig) -> Result<()> {
        let pipeline = Pipeline::from_config(&cfg)?;
        self.configure_with(cfg, pipeline);
        Ok(())
    }

    /// Like [`configure`](Self::configure) with a prebuilt pipeline.
    pub fn configure_with(&self, cfg: DeepSpaceConfig, pipeline: Pipeline) {
        let period = cfg.interval();
        tracing::info!(
            target: "dss",
            interval_ms = period.as_millis() as u64,
            sources = ?pipeline.source_names(),
            "scheduling fetch"
        );
        let runner = Arc::new(CycleRunner::new(pipeline, self.sink.clone()));

        let task_runner = runner.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // first tick completes immediately: initial fetch on configuration
                ticker.tick().await;
                task_runner.run_guarded().await;
            }
        });

        let mut armed = self.armed.lock();
        if let Some(old) = armed.task.replace(task) {
            old.abort();
        }
        if let Some(old) = armed.runner.replace(runner) {
            old.retire();
        }
        armed.config = Arc::new(cfg);
    }

    /// Run a cycle now, outside the timer. `None` if not configured, already busy,
    /// or the configuration was replaced before the cycle settled.
    pub async fn refresh_now(&self) -> Option<EventSet> {
        let runner = self.armed.lock().runner.clone()?;
        runner.run_guarded().await
    }

    pub fn config(&self) -> Arc<DeepSpaceConfig> {
        self.armed.lock().config.clone()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .task
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub fn stop(&self) {
        let mut armed = self.armed.lock();
        if let Some(task) = armed.task.take() {
            task.abort();
        }
        if let Some(runner) = armed.runner.take() {
            runner.retire();
        }
    }
}

impl Drop for FetchScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.armed.get_mut().task.take() {
            task.abort();
        }
    }
}
