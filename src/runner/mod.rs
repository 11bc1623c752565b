//! Task execution engine.
//!
//! [`TaskRunner`] executes a [`TaskQueue`] strictly in order on a single
//! dedicated worker thread and streams [`RunnerEvent`]s back to the owner
//! over an ordered channel. The engine is **framework-agnostic**: it has no
//! dependency on the UI layer and is driven entirely through the returned
//! event receiver.
//!
//! # Contract
//!
//! For a queue of N tasks with no failure and no cancellation, the event
//! stream is, for each index i in 0..N:
//! `TaskStarted(i)`, `Progress(i, N)`, `TaskCompleted(i)`, followed by a
//! final `Progress(N, N)` and exactly one `AllCompleted` carrying N results
//! in queue order.
//!
//! The first failing operation produces exactly one [`RunnerEvent::Error`]
//! naming the failing task, and the run aborts: no further events, no
//! further tasks (fail-fast). A panicking operation is caught and reported
//! the same way; no fault crosses the thread boundary raw.
//!
//! Cancellation is cooperative. The flag is checked before starting a task
//! and again after an operation returns; an in-flight operation always runs
//! to completion or to its own failure. Once the flag is observed the worker
//! stops silently, emitting nothing further. Exactly one terminal outcome
//! occurs per run: `AllCompleted`, `Error`, or cancellation silence.

use crate::metrics;
use crate::models::{TaskDescriptor, TaskQueue};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::mpsc;

/// Lifecycle events emitted by the worker thread, in execution order.
#[derive(Debug)]
pub enum RunnerEvent<T> {
    /// Task `index` is about to execute
    TaskStarted { index: usize, description: String },

    /// `current` of `total` tasks have completed
    Progress { current: usize, total: usize },

    /// Task `index` returned successfully
    TaskCompleted { index: usize },

    /// Every task completed; results are in queue order, one per task
    AllCompleted(Vec<T>),

    /// Task `index` failed; the run is aborted and no further events follow
    Error {
        index: usize,
        description: String,
        message: String,
    },
}

/// Errors reported synchronously by [`TaskRunner::start`].
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("task queue is empty")]
    EmptyQueue,

    #[error("runner has already been started; create a new runner per run")]
    AlreadyStarted,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Single-use sequential task executor.
///
/// A runner owns one run: construct it, call [`start`](Self::start) once with
/// the queue, drain the returned receiver, then discard the runner. Starting
/// a second time fails with [`RunnerError::AlreadyStarted`].
///
/// # Thread Safety
///
/// The only state shared with the worker thread is the cancellation flag
/// (owner writes, worker reads; an [`AtomicBool`] gives the required
/// visibility without a lock). Results are owned by the worker until shipped
/// inside the terminal [`RunnerEvent::AllCompleted`].
pub struct TaskRunner {
    /// Monotonic false-to-true cancellation flag, read at task boundaries
    cancel: Arc<AtomicBool>,

    /// Worker thread handle, taken by [`join`](Self::join)
    worker: Option<JoinHandle<()>>,

    started: bool,
}

impl TaskRunner {
    /// Create a fresh runner for a single run.
    pub fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
            started: false,
        }
    }

    /// Begin asynchronous execution of `queue` on a dedicated worker thread.
    ///
    /// Fails with [`RunnerError::EmptyQueue`] for an empty queue (no thread
    /// is spawned) and [`RunnerError::AlreadyStarted`] if this runner already
    /// ran. On success, returns the receiver for the run's event stream.
    pub fn start<T: Send + 'static>(
        &mut self,
        queue: TaskQueue<T>,
    ) -> Result<mpsc::UnboundedReceiver<RunnerEvent<T>>, RunnerError> {
        if self.started {
            return Err(RunnerError::AlreadyStarted);
        }
        if queue.is_empty() {
            return Err(RunnerError::EmptyQueue);
        }
        self.started = true;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel = Arc::clone(&self.cancel);
        let tasks = queue.into_tasks();

        tracing::info!("Starting task run with {} tasks", tasks.len());

        let handle = std::thread::Builder::new()
            .name("rundialog-worker".to_string())
            .spawn(move || run_queue(tasks, cancel, event_tx))?;

        self.worker = Some(handle);
        Ok(event_rx)
    }

    /// Request cooperative cancellation.
    ///
    /// The flag is observed only at task boundaries; an in-flight operation
    /// runs to completion. After the flag is observed no further tasks start
    /// and no terminal event fires.
    pub fn cancel(&self) {
        if !self.cancel.swap(true, Ordering::SeqCst) {
            tracing::info!("Cancellation requested - run will stop at the next task boundary");
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Block until the worker thread has exited.
    ///
    /// Used by the dialog's cancellation path; the wait is bounded only by
    /// the in-flight operation. Safe to call when no worker was spawned.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            // run_queue catches task panics, so this indicates a bug in the
            // runner itself rather than in a task body
            tracing::error!("Worker thread panicked outside of task execution");
        }
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker-thread loop: execute every task in order, emitting lifecycle
/// events, until completion, first failure, or observed cancellation.
fn run_queue<T: Send>(
    tasks: Vec<TaskDescriptor<T>>,
    cancel: Arc<AtomicBool>,
    event_tx: mpsc::UnboundedSender<RunnerEvent<T>>,
) {
    let total = tasks.len();
    let mut results = Vec::with_capacity(total);

    for (index, descriptor) in tasks.into_iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            tracing::warn!(index, "Cancellation observed before task start - stopping run");
            return;
        }

        let (description, operation) = descriptor.into_parts();
        tracing::debug!(index, %description, "Task started");

        // Send failures mean the receiver is gone; the run keeps executing
        // since tasks may have side effects the caller still wants
        let _ = event_tx.send(RunnerEvent::TaskStarted {
            index,
            description: description.clone(),
        });
        let _ = event_tx.send(RunnerEvent::Progress {
            current: index,
            total,
        });

        let failure = match panic::catch_unwind(AssertUnwindSafe(operation)) {
            Ok(Ok(value)) => {
                results.push(value);
                None
            }
            Ok(Err(err)) => Some(format!("{err:#}")),
            Err(payload) => Some(panic_message(payload)),
        };

        if let Some(message) = failure {
            tracing::error!(index, %description, %message, "Task failed - aborting run");
            metrics::global().record_task_failed();
            let _ = event_tx.send(RunnerEvent::Error {
                index,
                description,
                message,
            });
            return;
        }

        metrics::global().record_task_completed();

        if cancel.load(Ordering::SeqCst) {
            tracing::warn!(index, "Cancellation observed after task completion - stopping run");
            return;
        }

        let _ = event_tx.send(RunnerEvent::TaskCompleted { index });
    }

    tracing::info!("All {} tasks completed", total);
    let _ = event_tx.send(RunnerEvent::Progress {
        current: total,
        total,
    });
    let _ = event_tx.send(RunnerEvent::AllCompleted(results));
}

/// Render a caught panic payload as an error message.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use proptest::prelude::*;
    use std::time::Duration;

    /// Drain every event from a receiver once the worker has finished.
    fn collect_events<T>(mut rx: mpsc::UnboundedReceiver<RunnerEvent<T>>) -> Vec<RunnerEvent<T>> {
        let mut events = Vec::new();
        while let Some(event) = rx.blocking_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_empty_queue_fails_without_spawning() {
        let mut runner = TaskRunner::new();
        let queue: TaskQueue<i32> = TaskQueue::new();

        let err = runner.start(queue).unwrap_err();
        assert!(matches!(err, RunnerError::EmptyQueue));
        assert!(runner.worker.is_none());
    }

    #[test]
    fn test_second_start_fails() {
        let mut runner = TaskRunner::new();
        let rx = runner.start(TaskQueue::new().task("one", || Ok(1))).unwrap();
        drop(rx);

        let err = runner
            .start(TaskQueue::new().task("two", || Ok(2)))
            .unwrap_err();
        assert!(matches!(err, RunnerError::AlreadyStarted));
    }

    #[test]
    fn test_success_event_order() {
        let mut runner = TaskRunner::new();
        let queue = TaskQueue::new().task("a", || Ok(1)).task("b", || Ok(2));

        let rx = runner.start(queue).unwrap();
        let events = collect_events(rx);
        runner.join();

        // Started/Progress/Completed per task, then Progress(N,N), then AllCompleted
        assert_eq!(events.len(), 8);
        assert!(matches!(
            events[0],
            RunnerEvent::TaskStarted { index: 0, ref description } if description == "a"
        ));
        assert!(matches!(
            events[1],
            RunnerEvent::Progress {
                current: 0,
                total: 2
            }
        ));
        assert!(matches!(events[2], RunnerEvent::TaskCompleted { index: 0 }));
        assert!(matches!(
            events[3],
            RunnerEvent::TaskStarted { index: 1, ref description } if description == "b"
        ));
        assert!(matches!(
            events[4],
            RunnerEvent::Progress {
                current: 1,
                total: 2
            }
        ));
        assert!(matches!(events[5], RunnerEvent::TaskCompleted { index: 1 }));
        assert!(matches!(
            events[6],
            RunnerEvent::Progress {
                current: 2,
                total: 2
            }
        ));
        assert!(matches!(events[7], RunnerEvent::AllCompleted(ref results) if *results == vec![1, 2]));
    }

    #[test]
    fn test_failure_aborts_run() {
        let mut runner = TaskRunner::new();
        let queue = TaskQueue::new()
            .task("a", || Ok(1))
            .task("b", || Err(anyhow!("boom")))
            .task("c", || Ok(3));

        let rx = runner.start(queue).unwrap();
        let events = collect_events(rx);
        runner.join();

        // a runs fully, b starts then errors, c never appears
        assert!(matches!(events[2], RunnerEvent::TaskCompleted { index: 0 }));
        assert!(
            matches!(events[3], RunnerEvent::TaskStarted { index: 1, .. }),
            "failing task still reports its start"
        );
        let last = events.last().unwrap();
        assert!(matches!(
            last,
            RunnerEvent::Error { index: 1, description, message }
                if description == "b" && message.contains("boom")
        ));
        assert_eq!(events.len(), 6);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, RunnerEvent::AllCompleted(_))),
            "no terminal success event after a failure"
        );
    }

    #[test]
    fn test_panic_converted_to_error_event() {
        let mut runner = TaskRunner::new();
        let queue: TaskQueue<i32> = TaskQueue::new().task("explode", || panic!("kaboom"));

        let rx = runner.start(queue).unwrap();
        let events = collect_events(rx);
        runner.join();

        let last = events.last().unwrap();
        assert!(matches!(
            last,
            RunnerEvent::Error { index: 0, message, .. } if message.contains("kaboom")
        ));
    }

    #[test]
    fn test_cancellation_before_next_task() {
        let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let mut runner = TaskRunner::new();
        let queue = TaskQueue::new()
            .task("slow", move || {
                // Tell the test we are in flight, then block until it has
                // requested cancellation
                started_tx.send(()).map_err(|e| anyhow!(e))?;
                release_rx
                    .recv_timeout(Duration::from_secs(5))
                    .map_err(|e| anyhow!(e))?;
                Ok(1)
            })
            .task("never", || Ok(2));

        let rx = runner.start(queue).unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        runner.cancel();
        release_tx.send(()).unwrap();

        let events = collect_events(rx);
        runner.join();

        // The in-flight task ran to completion, but nothing after the
        // boundary check: no TaskCompleted, no second task, no terminal event
        assert!(matches!(events[0], RunnerEvent::TaskStarted { index: 0, .. }));
        assert_eq!(events.len(), 2);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, RunnerEvent::TaskCompleted { .. })),
        );
        assert!(runner.is_cancel_requested());
    }

    #[test]
    fn test_cancel_before_start_runs_nothing() {
        let mut runner = TaskRunner::new();
        runner.cancel();

        let queue = TaskQueue::new().task("skipped", || Ok(1));
        let rx = runner.start(queue).unwrap();
        let events = collect_events(rx);
        runner.join();

        assert!(events.is_empty());
    }

    #[test]
    fn test_progress_monotonic() {
        let mut runner = TaskRunner::new();
        let queue = TaskQueue::new()
            .task("a", || Ok(()))
            .task("b", || Ok(()))
            .task("c", || Ok(()));

        let rx = runner.start(queue).unwrap();
        let events = collect_events(rx);
        runner.join();

        let progress: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                RunnerEvent::Progress { current, .. } => Some(*current),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 1, 2, 3]);
    }

    proptest! {
        /// For any non-empty set of succeeding tasks, the results arrive in
        /// queue order with one entry per task, and exactly one terminal
        /// event fires.
        #[test]
        fn prop_results_preserve_queue_order(values in prop::collection::vec(any::<i64>(), 1..32)) {
            let mut queue = TaskQueue::new();
            for value in &values {
                let value = *value;
                queue.push(crate::models::TaskDescriptor::new(
                    format!("task {value}"),
                    move || Ok(value),
                ));
            }

            let mut runner = TaskRunner::new();
            let rx = runner.start(queue).unwrap();
            let events = collect_events(rx);
            runner.join();

            let terminals: Vec<_> = events
                .iter()
                .filter(|e| matches!(e, RunnerEvent::AllCompleted(_) | RunnerEvent::Error { .. }))
                .collect();
            prop_assert_eq!(terminals.len(), 1);

            match events.last().unwrap() {
                RunnerEvent::AllCompleted(results) => prop_assert_eq!(results, &values),
                other => prop_assert!(false, "expected AllCompleted, got {:?}", other),
            }
        }
    }
}
