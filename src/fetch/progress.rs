//! Progress signals emitted by the worker pool.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{info, warn};

use super::FetchStage;

/// Receives progress signals from one pool run.
///
/// The pool calls [`on_start`](Self::on_start) once, then
/// [`on_item_done`](Self::on_item_done) exactly `total` times, then
/// [`on_finish`](Self::on_finish) once. Calls are synchronous and must not
/// block; implementations that render UI should hand off and return.
pub trait ProgressReporter: Send + Sync {
    /// A batch of `total` items is starting.
    fn on_start(&self, total: usize);

    /// One item finished, successfully or not.
    fn on_item_done(&self);

    /// Every item finished.
    fn on_finish(&self, had_errors: bool);
}

/// Discards all progress signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn on_start(&self, _total: usize) {}

    fn on_item_done(&self) {}

    fn on_finish(&self, _had_errors: bool) {}
}

/// Reports progress through `tracing` events.
#[derive(Debug)]
pub struct LogProgress {
    stage: FetchStage,
    total: AtomicUsize,
    done: AtomicUsize,
}

impl LogProgress {
    /// Creates a reporter labelled with `stage`.
    #[must_use]
    pub fn new(stage: FetchStage) -> Self {
        Self {
            stage,
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }
    }

    /// Number of items reported done so far.
    #[must_use]
    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }
}

impl ProgressReporter for LogProgress {
    fn on_start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
        info!(stage = %self.stage, total, "fetch batch started");
    }

    fn on_item_done(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        tracing::debug!(stage = %self.stage, done, total, "fetch item finished");
    }

    fn on_finish(&self, had_errors: bool) {
        let done = self.done();
        if had_errors {
            warn!(stage = %self.stage, done, "fetch batch finished with errors");
        } else {
            info!(stage = %self.stage, done, "fetch batch finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_counts_items() {
        let progress = LogProgress::new(FetchStage::Detail);
        progress.on_start(3);
        progress.on_item_done();
        progress.on_item_done();
        assert_eq!(progress.done(), 2);
        progress.on_finish(false);
    }

    #[test]
    fn test_log_progress_resets_on_start() {
        let progress = LogProgress::new(FetchStage::List);
        progress.on_start(1);
        progress.on_item_done();
        progress.on_start(2);
        assert_eq!(progress.done(), 0);
    }
}
