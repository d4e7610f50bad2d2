use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Events emitted by the [`super::BatchRunner`].
#[derive(Debug, Clone)]
pub enum BatchEvent {
    RunStarted { configs: usize },
    ConfigSkipped { name: String },
    ConfigFinished { name: String, output_rows: usize },
    ConfigFailed { name: String, error: String },
    RunFinished {
        elapsed: Duration,
        metrics: BatchMetricsSnapshot,
    },
}

/// Observer hook for batch events.
pub trait BatchObserver: Send + Sync {
    fn on_event(&self, event: &BatchEvent);
}

/// Forwards batch events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_event(&self, event: &BatchEvent) {
        match event {
            BatchEvent::RunStarted { configs } => debug!(configs, "batch started"),
            BatchEvent::ConfigSkipped { name } => warn!(config = %name, "config skipped: invalid shape"),
            BatchEvent::ConfigFinished { name, output_rows } => {
                debug!(config = %name, output_rows, "config normalized")
            }
            BatchEvent::ConfigFailed { name, error } => warn!(config = %name, %error, "config failed"),
            BatchEvent::RunFinished { elapsed, metrics } => {
                info!(elapsed = ?elapsed, %metrics, "batch finished")
            }
        }
    }
}

/// Counters for batch runs.
///
/// The runner updates these during execution; callers can snapshot them at any time.
#[derive(Debug, Default)]
pub struct BatchMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,
    configs_run: AtomicU64,
    configs_skipped: AtomicU64,
    configs_failed: AtomicU64,
    rows_produced: AtomicU64,
}

impl BatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.configs_run.store(0, Ordering::SeqCst);
        self.configs_skipped.store(0, Ordering::SeqCst);
        self.configs_failed.store(0, Ordering::SeqCst);
        self.rows_produced.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_finished(&self, rows: usize) {
        let _ = self.configs_run.fetch_add(1, Ordering::SeqCst);
        let _ = self.rows_produced.fetch_add(rows as u64, Ordering::SeqCst);
    }

    pub fn on_skipped(&self) {
        let _ = self.configs_run.fetch_add(1, Ordering::SeqCst);
        let _ = self.configs_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_failed(&self) {
        let _ = self.configs_run.fetch_add(1, Ordering::SeqCst);
        let _ = self.configs_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> BatchMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        BatchMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            configs_run: self.configs_run.load(Ordering::SeqCst),
            configs_skipped: self.configs_skipped.load(Ordering::SeqCst),
            configs_failed: self.configs_failed.load(Ordering::SeqCst),
            rows_produced: self.rows_produced.load(Ordering::SeqCst),
        }
    }
}

/// Immutable snapshot of [`BatchMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub configs_run: u64,
    pub configs_skipped: u64,
    pub configs_failed: u64,
    pub rows_produced: u64,
}

impl fmt::Display for BatchMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, configs={}, skipped={}, failed={}, rows_produced={}, elapsed={:?}",
            self.run_id,
            self.configs_run,
            self.configs_skipped,
            self.configs_failed,
            self.rows_produced,
            self.elapsed
        )
    }
}
