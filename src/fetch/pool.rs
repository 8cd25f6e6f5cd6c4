//! Fixed-concurrency executor for fetch tasks.
//!
//! The [`WorkerPool`] runs a batch of independent [`FetchTask`]s with at most
//! `K = min(max_concurrency, tasks.len())` in flight, and returns only after
//! every task has finished.
//!
//! # Concurrency Model
//!
//! - Each task runs in its own Tokio task
//! - A semaphore permit is acquired before a task is spawned
//! - The permit lives in a guard owned by the spawned task, so it is released
//!   when the task returns, fails or panics
//! - A failing task never cancels its siblings

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument, warn};

use super::progress::ProgressReporter;
use super::{FetchError, TaskSubject};

/// One independent unit of network work.
#[async_trait]
pub trait FetchTask: Send + 'static {
    /// Parsed result of a successful fetch.
    type Output: Send + 'static;

    /// Identifier and stage this task works on.
    fn subject(&self) -> TaskSubject;

    /// Performs the fetch.
    async fn run(self) -> Result<Self::Output, FetchError>;
}

/// Results and errors of one pool run.
///
/// `results` are in task submission order. Every submitted task contributes
/// exactly one entry to either `results` or `errors`.
#[derive(Debug)]
pub struct PoolOutcome<T> {
    /// Successful task outputs.
    pub results: Vec<T>,
    /// Failed tasks.
    pub errors: Vec<FetchError>,
}

impl<T> Default for PoolOutcome<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> PoolOutcome<T> {
    /// Total number of tasks accounted for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    /// Returns true if no task was run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded worker pool with a full-barrier join.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_concurrency: usize,
}

impl WorkerPool {
    /// Creates a pool allowing at most `max_concurrency` tasks in flight.
    ///
    /// A pool with `max_concurrency == 0` runs nothing.
    #[must_use]
    pub fn new(max_concurrency: usize) -> Self {
        Self { max_concurrency }
    }

    /// Configured concurrency ceiling.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Concurrency actually used for a batch of `task_count` tasks.
    #[must_use]
    pub fn effective_concurrency(&self, task_count: usize) -> usize {
        self.max_concurrency.min(task_count)
    }

    /// Runs every task once and waits for all of them.
    ///
    /// Returns immediately with an empty outcome when there are no tasks or
    /// the effective concurrency is zero; `progress` is not signalled in that
    /// case.
    #[instrument(skip_all, fields(tasks = tasks.len(), max_concurrency = self.max_concurrency))]
    pub async fn run<T: FetchTask>(
        &self,
        tasks: Vec<T>,
        progress: Arc<dyn ProgressReporter>,
    ) -> PoolOutcome<T::Output> {
        let total = tasks.len();
        let concurrency = self.effective_concurrency(total);
        if concurrency == 0 {
            debug!("nothing to run");
            return PoolOutcome::default();
        }

        progress.on_start(total);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::with_capacity(total);
        let mut outcome = PoolOutcome {
            results: Vec::with_capacity(total),
            errors: Vec::new(),
        };

        for task in tasks {
            let subject = task.subject();

            // Blocks while `concurrency` tasks are in flight.
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                outcome.errors.push(subject.aborted("worker pool closed"));
                progress.on_item_done();
                continue;
            };

            let slot = SlotGuard {
                _permit: permit,
                progress: Arc::clone(&progress),
            };
            handles.push((
                subject,
                tokio::spawn(async move {
                    let _slot = slot;
                    task.run().await
                }),
            ));
        }

        debug!(task_count = handles.len(), concurrency, "waiting for tasks");

        for (subject, handle) in handles {
            match handle.await {
                Ok(Ok(output)) => outcome.results.push(output),
                Ok(Err(error)) => {
                    debug!(error = %error, "task failed");
                    outcome.errors.push(error);
                }
                Err(join_error) => {
                    warn!(subject = %subject.subject, error = %join_error, "fetch task panicked");
                    outcome.errors.push(subject.aborted(join_error.to_string()));
                }
            }
        }

        progress.on_finish(!outcome.errors.is_empty());
        debug!(
            succeeded = outcome.results.len(),
            failed = outcome.errors.len(),
            "pool run complete"
        );
        outcome
    }
}

/// Owns a concurrency slot for the lifetime of one spawned task.
struct SlotGuard {
    _permit: OwnedSemaphorePermit,
    progress: Arc<dyn ProgressReporter>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.progress.on_item_done();
    }
}
