//! Progress reporting after each completed item.

use std::io::Write;

use crate::stats::ProgressSnapshot;

/// Consumer of progress snapshots. Called synchronously from whichever worker
/// finished the item, so implementations must be thread-safe.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, snapshot: &ProgressSnapshot);
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressSnapshot) + Send + Sync,
{
    fn report(&self, snapshot: &ProgressSnapshot) {
        self(snapshot)
    }
}

/// Prints each report to stdout followed by a blank line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn report(&self, snapshot: &ProgressSnapshot) {
        // One locked write per report so concurrent workers don't interleave lines.
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", snapshot);
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _snapshot: &ProgressSnapshot) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_reporters() {
        let seen = Mutex::new(Vec::new());
        let reporter = |s: &ProgressSnapshot| seen.lock().unwrap().push(s.completed_items);
        reporter.report(&ProgressSnapshot::compute(2, 1, 5, 1));
        reporter.report(&ProgressSnapshot::compute(2, 2, 9, 2));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
