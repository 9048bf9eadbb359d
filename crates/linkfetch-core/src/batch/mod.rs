//! Bounded-concurrency batch downloader.
//!
//! Items go into a shared FIFO queue; `min(concurrency, items)` worker threads
//! pull from it until it is empty. Each item is fetched, persisted, counted in
//! the run's `StatsAggregator` and reported. A failed item is logged and
//! counted but never aborts the batch or reaches the caller as an error.

mod task;

pub use task::{TaskError, TaskSuccess};

use std::collections::VecDeque;
use std::sync::{mpsc, Mutex, PoisonError};
use std::time::Instant;

use crate::config::Concurrency;
use crate::fetch::Fetcher;
use crate::links::DownloadItem;
use crate::progress::ProgressReporter;
use crate::stats::{StatsAggregator, Totals};
use crate::storage::Storage;

/// An item that produced no file, with the reason.
#[derive(Debug)]
pub struct ItemFailure {
    pub item: DownloadItem,
    pub error: TaskError,
}

/// Outcome of one run. `completed_items + failed_items == total_items`.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total_items: u64,
    pub completed_items: u64,
    pub failed_items: u64,
    pub total_bytes: u64,
    pub total_elapsed_ms: u64,
    /// In input order.
    pub failures: Vec<ItemFailure>,
}

impl BatchSummary {
    fn from_parts(totals: Totals, failures: Vec<ItemFailure>) -> Self {
        Self {
            total_items: totals.total_items,
            completed_items: totals.completed_items,
            failed_items: totals.failed_items,
            total_bytes: totals.total_bytes,
            total_elapsed_ms: totals.total_elapsed_ms,
            failures,
        }
    }

    /// True when there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.total_items > 0 && self.completed_items == 0
    }
}

/// Runs download tasks over a fixed-size worker set.
#[derive(Debug)]
pub struct BatchDownloader<F, S> {
    fetcher: F,
    storage: S,
    concurrency: Concurrency,
    fail_on_http_error: bool,
    // Serializes reporter calls so snapshots reach it in non-decreasing order.
    report_lock: Mutex<()>,
}

impl<F: Fetcher, S: Storage> BatchDownloader<F, S> {
    pub fn new(fetcher: F, storage: S, concurrency: Concurrency) -> Self {
        Self {
            fetcher,
            storage,
            concurrency,
            fail_on_http_error: false,
            report_lock: Mutex::new(()),
        }
    }

    /// Treat HTTP status >= 400 as a failed item instead of saving the error body.
    pub fn fail_on_http_error(mut self, yes: bool) -> Self {
        self.fail_on_http_error = yes;
        self
    }

    /// Downloads every item and returns once all of them succeeded or failed.
    pub fn run(&self, items: Vec<DownloadItem>, reporter: &dyn ProgressReporter) -> BatchSummary {
        let count = items.len();
        let stats = StatsAggregator::new(count as u64);
        if count == 0 {
            tracing::info!("no items to download");
            return BatchSummary::from_parts(stats.totals(), Vec::new());
        }

        let num_workers = self.concurrency.get().min(count);
        tracing::info!(items = count, workers = num_workers, "starting batch");

        let work: Mutex<VecDeque<(usize, DownloadItem)>> =
            Mutex::new(items.into_iter().enumerate().collect());
        let (tx, rx) = mpsc::channel::<(usize, ItemFailure)>();

        std::thread::scope(|scope| {
            for _ in 0..num_workers {
                let tx = tx.clone();
                let work = &work;
                let stats = &stats;
                scope.spawn(move || {
                    while let Some((index, item)) = next_item(work) {
                        if let Err(error) = self.process(&item, stats, reporter) {
                            let _ = tx.send((index, ItemFailure { item, error }));
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut failures: Vec<(usize, ItemFailure)> = rx.into_iter().collect();
        failures.sort_by_key(|(index, _)| *index);
        let summary = BatchSummary::from_parts(
            stats.totals(),
            failures.into_iter().map(|(_, f)| f).collect(),
        );
        tracing::info!(
            total = summary.total_items,
            completed = summary.completed_items,
            failed = summary.failed_items,
            bytes = summary.total_bytes,
            "batch finished"
        );
        summary
    }

    fn process(
        &self,
        item: &DownloadItem,
        stats: &StatsAggregator,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), TaskError> {
        let started = Instant::now();
        match task::run_task(&self.fetcher, &self.storage, item, self.fail_on_http_error) {
            Ok(done) => {
                let own = stats.record_success(done.bytes, started.elapsed());
                tracing::debug!(
                    url = %item.source,
                    path = %done.path.display(),
                    bytes = done.bytes,
                    status = done.status_code,
                    completed = own.completed_items,
                    "item downloaded"
                );
                let _guard = self
                    .report_lock
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                reporter.report(&stats.snapshot());
                Ok(())
            }
            Err(e) => {
                stats.record_failure();
                tracing::warn!(
                    url = %item.source,
                    destination = %item.destination_name,
                    "item failed: {}",
                    e
                );
                Err(e)
            }
        }
    }
}

/// Pops the next queued item. The queue lock is released before the task runs.
fn next_item(work: &Mutex<VecDeque<(usize, DownloadItem)>>) -> Option<(usize, DownloadItem)> {
    work.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}
