//! Cross-task download statistics.
//!
//! One aggregator is created per batch run and shared by reference with every
//! worker. Each field is updated with a single atomic add, so concurrent tasks
//! never lose an increment and no lock spans more than one field.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time view of the statistics handed to a progress reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    /// `floor(100 * completed / total)`, 0 for an empty batch.
    pub percent: u64,
    pub completed_items: u64,
    pub total_items: u64,
    pub total_bytes: u64,
    /// Sum of per-task wall-clock durations, not elapsed batch time.
    pub total_elapsed_ms: u64,
    /// `completed / max(total_elapsed_ms, 1)`, integer division. Mostly 0 for real files.
    pub items_per_ms: u64,
}

impl ProgressSnapshot {
    pub fn compute(
        total_items: u64,
        completed_items: u64,
        total_bytes: u64,
        total_elapsed_ms: u64,
    ) -> Self {
        let percent = if total_items == 0 {
            0
        } else {
            100 * completed_items / total_items
        };
        Self {
            percent,
            completed_items,
            total_items,
            total_bytes,
            total_elapsed_ms,
            items_per_ms: completed_items / total_elapsed_ms.max(1),
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Completed: {}%", self.percent)?;
        writeln!(
            f,
            "Downloaded: {} files, {} bytes",
            self.completed_items, self.total_bytes
        )?;
        writeln!(f, "Time: {} milliseconds", self.total_elapsed_ms)?;
        writeln!(
            f,
            "Average speed: {} files per millisecond",
            self.items_per_ms
        )
    }
}

/// Frozen counter values at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub total_items: u64,
    pub completed_items: u64,
    pub failed_items: u64,
    pub total_bytes: u64,
    pub total_elapsed_ms: u64,
}

/// Thread-safe counters for one batch run.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    total_items: AtomicU64,
    completed_items: AtomicU64,
    failed_items: AtomicU64,
    total_bytes: AtomicU64,
    total_elapsed_ms: AtomicU64,
}

impl StatsAggregator {
    pub fn new(total_items: u64) -> Self {
        Self {
            total_items: AtomicU64::new(total_items),
            ..Self::default()
        }
    }

    /// Records one finished item and returns the snapshot built from the
    /// values this call's adds produced. Other tasks may have added more by
    /// the time it returns; reporters get a fresh [`snapshot`](Self::snapshot).
    pub fn record_success(&self, bytes: u64, elapsed: Duration) -> ProgressSnapshot {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let completed = self.completed_items.fetch_add(1, Ordering::AcqRel) + 1;
        let total_bytes = self.total_bytes.fetch_add(bytes, Ordering::AcqRel) + bytes;
        let total_elapsed_ms = self
            .total_elapsed_ms
            .fetch_add(elapsed_ms, Ordering::AcqRel)
            .saturating_add(elapsed_ms);
        ProgressSnapshot::compute(
            self.total_items.load(Ordering::Acquire),
            completed,
            total_bytes,
            total_elapsed_ms,
        )
    }

    /// Records one failed item. Failures never touch bytes or elapsed time.
    pub fn record_failure(&self) {
        self.failed_items.fetch_add(1, Ordering::AcqRel);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let t = self.totals();
        ProgressSnapshot::compute(
            t.total_items,
            t.completed_items,
            t.total_bytes,
            t.total_elapsed_ms,
        )
    }

    pub fn totals(&self) -> Totals {
        Totals {
            total_items: self.total_items.load(Ordering::Acquire),
            completed_items: self.completed_items.load(Ordering::Acquire),
            failed_items: self.failed_items.load(Ordering::Acquire),
            total_bytes: self.total_bytes.load(Ordering::Acquire),
            total_elapsed_ms: self.total_elapsed_ms.load(Ordering::Acquire),
        }
    }
}
