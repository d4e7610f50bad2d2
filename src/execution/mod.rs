//! Batch execution of many normalization configs over one table.
//!
//! Query results are typically normalized with a whole set of configs (one per record type).
//! The [`BatchRunner`] runs them in parallel on a rayon pool over the shared, immutable input
//! and reports progress through [`BatchObserver`] hooks and [`BatchMetrics`]. A config that is
//! skipped or fails never aborts the rest of the batch.

mod observer;

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{is_valid, ConfigSet, NormalizationConfig};
use crate::error::{RemapError, RemapResult};
use crate::processing::normalize;
use crate::types::Table;

pub use observer::{BatchEvent, BatchMetrics, BatchMetricsSnapshot, BatchObserver, TracingObserver};

/// Configuration for the [`BatchRunner`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Number of worker threads.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

/// Result of running one named config.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The config was applied; the table may be empty if no rows matched.
    Normalized(Table),
    /// The config failed the shape check and was not applied.
    Skipped,
    /// The config could not be interpreted.
    Failed(RemapError),
}

impl BatchOutcome {
    /// The normalized table, if the config was applied.
    pub fn table(&self) -> Option<&Table> {
        match self {
            Self::Normalized(t) => Some(t),
            _ => None,
        }
    }
}

/// A [`BatchOutcome`] with the name of the config that produced it.
#[derive(Debug)]
pub struct NamedOutcome {
    pub name: String,
    pub outcome: BatchOutcome,
}

/// Runs config sets against tables on a dedicated thread pool.
pub struct BatchRunner {
    pool: ThreadPool,
    observer: Option<Arc<dyn BatchObserver>>,
    metrics: Arc<BatchMetrics>,
}

impl BatchRunner {
    /// Create a new runner with the given options.
    ///
    /// `num_threads == Some(0)` is rejected as [`RemapError::InvalidConfig`].
    pub fn new(opts: BatchOptions) -> RemapResult<Self> {
        if opts.num_threads == Some(0) {
            return Err(RemapError::InvalidConfig {
                message: "num_threads must be > 0 when set".to_string(),
            });
        }
        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            observer: None,
            metrics: Arc::new(BatchMetrics::new()),
        })
    }

    /// Attach an observer for batch events.
    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to the runner's metrics.
    pub fn metrics(&self) -> Arc<BatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Normalize `table` with every config in `configs`.
    ///
    /// Outcomes are returned in config order regardless of completion order.
    pub fn run(&self, table: &Table, configs: &ConfigSet) -> Vec<NamedOutcome> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(BatchEvent::RunStarted {
            configs: configs.len(),
        });

        let entries: Vec<(&str, &serde_json::Value)> = configs.iter().collect();
        let outcomes: Vec<NamedOutcome> = self.pool.install(|| {
            entries
                .into_par_iter()
                .map(|(name, raw)| NamedOutcome {
                    name: name.to_string(),
                    outcome: self.run_one(name, table, raw),
                })
                .collect()
        });

        self.metrics.end_run(start.elapsed());
        self.emit(BatchEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        outcomes
    }

    fn run_one(&self, name: &str, table: &Table, raw: &serde_json::Value) -> BatchOutcome {
        if !is_valid(raw) {
            self.metrics.on_skipped();
            self.emit(BatchEvent::ConfigSkipped {
                name: name.to_string(),
            });
            return BatchOutcome::Skipped;
        }

        match NormalizationConfig::from_value(raw) {
            Ok(config) => {
                let out = normalize(table, &config);
                self.metrics.on_finished(out.row_count());
                self.emit(BatchEvent::ConfigFinished {
                    name: name.to_string(),
                    output_rows: out.row_count(),
                });
                BatchOutcome::Normalized(out)
            }
            Err(e) => {
                self.metrics.on_failed();
                self.emit(BatchEvent::ConfigFailed {
                    name: name.to_string(),
                    error: e.to_string(),
                });
                BatchOutcome::Failed(e)
            }
        }
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
