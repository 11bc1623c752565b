// TaskDialog - owns one TaskRunner per run and adapts its events onto a
// ProgressView plus caller-supplied terminal callbacks.
//
// It handles:
// - Starting the worker and the event-listener thread
// - Translating runner events into view updates through the UiBridge
// - Exactly-once delivery of the terminal outcome (complete / error)
// - Cooperative cancellation with a bounded-by-the-in-flight-task wait
// - Auto-close timers on the tokio runtime

use crate::metrics;
use crate::models::{DialogOptions, ERROR_CLOSE_DELAY, TaskQueue};
use crate::runner::{RunnerError, RunnerEvent, TaskRunner};
use crate::state::{DialogPhase, PhaseTracker};
use crate::ui::bridge::UiBridge;
use crate::ui::view::ProgressView;
use std::thread::JoinHandle;
use std::time::Duration;

/// Invoked exactly once with the full ordered results on success.
pub type CompleteCallback<T> = Box<dyn FnOnce(Vec<T>) + Send>;

/// Invoked exactly once with the rendered error text on failure.
pub type ErrorCallback = Box<dyn FnOnce(String) + Send>;

/// Progress dialog adapter over a sequential background task run.
///
/// One dialog owns one run: set the queue and callbacks, call
/// [`start`](Self::start), and exactly one of the completion callback, the
/// error callback, or silent closure (after [`cancel`](Self::cancel)) will
/// occur. Create a fresh dialog for any subsequent run.
///
/// # Example
/// ```ignore
/// let mut dialog = TaskDialog::new(bridge);
/// dialog.set_tasks(
///     TaskQueue::new()
///         .task("Loading library", || load_library())
///         .task("Building index", || build_index()),
/// );
/// dialog.set_on_complete(|results| tracing::info!("{} steps done", results.len()));
/// dialog.set_on_error(|message| tracing::error!("{message}"));
/// dialog.start()?;
/// ```
pub struct TaskDialog<T, V> {
    queue: Option<TaskQueue<T>>,
    bridge: UiBridge<V>,
    on_complete: Option<CompleteCallback<T>>,
    on_error: Option<ErrorCallback>,
    options: DialogOptions,
    phase: PhaseTracker,
    runner: Option<TaskRunner>,
    listener: Option<JoinHandle<()>>,
}

impl<T, V> TaskDialog<T, V>
where
    T: Send + 'static,
    V: ProgressView + 'static,
{
    /// Create an idle dialog over the given view bridge.
    pub fn new(bridge: UiBridge<V>) -> Self {
        Self {
            queue: None,
            bridge,
            on_complete: None,
            on_error: None,
            options: DialogOptions::default(),
            phase: PhaseTracker::new(),
            runner: None,
            listener: None,
        }
    }

    /// Set the task queue to execute. Must be called before [`start`](Self::start).
    pub fn set_tasks(&mut self, queue: TaskQueue<T>) {
        self.queue = Some(queue);
    }

    /// Set the callback invoked with the ordered results on success.
    pub fn set_on_complete<F>(&mut self, callback: F)
    where
        F: FnOnce(Vec<T>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Set the callback invoked with the error text on failure.
    pub fn set_on_error<F>(&mut self, callback: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
    }

    /// Configure success-path auto-close behavior.
    ///
    /// The error-display delay is fixed at [`ERROR_CLOSE_DELAY`].
    pub fn set_auto_close(&mut self, enabled: bool, delay: Duration) {
        self.options.auto_close = enabled;
        // Saturate rather than truncate for delays beyond u64 milliseconds
        self.options.auto_close_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    }

    /// Replace the whole option set.
    pub fn set_options(&mut self, options: DialogOptions) {
        self.options = options;
    }

    /// Current phase of the run.
    ///
    /// After [`cancel`](Self::cancel) this reads [`DialogPhase::Cancelled`],
    /// which is how callers distinguish cancellation from other silent
    /// closures (no explicit cancelled callback exists).
    pub fn phase(&self) -> DialogPhase {
        self.phase.current()
    }

    /// Start executing the task queue.
    ///
    /// Fails with [`RunnerError::EmptyQueue`] when no tasks were set (no
    /// thread is spawned and the dialog stays idle) and with
    /// [`RunnerError::AlreadyStarted`] on reuse.
    pub fn start(&mut self) -> Result<(), RunnerError> {
        let queue = match self.queue.take() {
            Some(queue) if !queue.is_empty() => queue,
            _ => return Err(RunnerError::EmptyQueue),
        };
        if self.phase.begin_run().is_err() {
            return Err(RunnerError::AlreadyStarted);
        }

        let mut runner = TaskRunner::new();
        let mut event_rx = runner.start(queue)?;
        self.runner = Some(runner);

        let bridge = self.bridge.clone();
        let phase = self.phase.clone();
        let options = self.options.clone();
        let mut on_complete = self.on_complete.take();
        let mut on_error = self.on_error.take();

        let listener = std::thread::Builder::new()
            .name("rundialog-listener".to_string())
            .spawn(move || {
                tracing::debug!("Dialog listener thread started");
                bridge.update_ui(|view: &V| view.set_status("Initializing..."));

                while let Some(event) = event_rx.blocking_recv() {
                    match event {
                        RunnerEvent::TaskStarted { index, description } => {
                            tracing::debug!(index, %description, "Task started");
                            bridge.update_ui(move |view: &V| view.set_status(&description));
                        }

                        RunnerEvent::Progress { current, total } => {
                            bridge.update_ui(move |view: &V| view.set_progress(current, total));
                        }

                        RunnerEvent::TaskCompleted { index } => {
                            tracing::debug!(index, "Task completed");
                        }

                        RunnerEvent::AllCompleted(results) => {
                            if !phase.try_finish(DialogPhase::Completed) {
                                tracing::warn!(
                                    "Run completed after the dialog left Running - dropping results"
                                );
                                break;
                            }
                            tracing::info!("All tasks completed ({} results)", results.len());
                            metrics::global().record_run_completed();

                            bridge.update_ui(|view: &V| view.show_complete());

                            // Callback fires before any auto-close timer starts
                            if let Some(callback) = on_complete.take() {
                                callback(results);
                            }

                            if options.auto_close {
                                let close_bridge = bridge.clone();
                                let delay = options.auto_close_delay();
                                bridge.spawn_async(move || async move {
                                    tokio::time::sleep(delay).await;
                                    close_bridge.update_ui(|view: &V| view.close());
                                });
                            }
                            break;
                        }

                        RunnerEvent::Error {
                            index,
                            description,
                            message,
                        } => {
                            if !phase.try_finish(DialogPhase::Failed) {
                                break;
                            }
                            let text = format!("Task '{description}' failed: {message}");
                            tracing::error!(index, "{text}");
                            metrics::global().record_run_failed();

                            {
                                let text = text.clone();
                                bridge.update_ui(move |view: &V| view.show_error(&text));
                            }

                            if let Some(callback) = on_error.take() {
                                callback(text);
                            }

                            // Errors always auto-close, after the longer fixed delay
                            let close_bridge = bridge.clone();
                            bridge.spawn_async(move || async move {
                                tokio::time::sleep(ERROR_CLOSE_DELAY).await;
                                close_bridge.update_ui(|view: &V| view.close());
                            });
                            break;
                        }
                    }
                }

                tracing::debug!("Dialog listener thread terminated");
            })?;

        self.listener = Some(listener);
        Ok(())
    }

    /// Request cancellation of a running queue.
    ///
    /// Marks the run cancelled (so a racing terminal event fires no
    /// callback), asks the worker to stop at its next boundary, blocks until
    /// the worker thread has exited (the wait is bounded by the in-flight
    /// task), then closes the dialog. No callback fires. Ignored when the
    /// dialog is not running.
    pub fn cancel(&mut self) {
        if !self.phase.try_finish(DialogPhase::Cancelled) {
            tracing::debug!("Cancel ignored - dialog is not running");
            return;
        }

        tracing::info!("Dialog cancellation requested");
        if let Some(runner) = self.runner.as_ref() {
            runner.cancel();
        }
        if let Some(mut runner) = self.runner.take() {
            runner.join();
        }
        metrics::global().record_run_cancelled();

        self.bridge.update_ui(|view: &V| view.close());
    }

    /// Block until the worker and listener threads have exited.
    ///
    /// Intended for host shutdown paths and tests; on the success and error
    /// paths the threads exit as soon as the terminal event is processed.
    pub fn join(&mut self) {
        if let Some(mut runner) = self.runner.take() {
            runner.join();
        }
        if let Some(listener) = self.listener.take()
            && listener.join().is_err()
        {
            tracing::error!("Dialog listener thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::bridge::{EventLoop, EventLoopClosed, ViewUpdate};

    struct NullView;

    impl ProgressView for NullView {
        fn set_status(&self, _text: &str) {}
        fn set_progress(&self, _current: usize, _total: usize) {}
        fn show_complete(&self) {}
        fn show_error(&self, _message: &str) {}
        fn close(&self) {}
    }

    struct NullEventLoop;

    impl EventLoop<NullView> for NullEventLoop {
        fn post(&self, _update: ViewUpdate<NullView>) -> Result<(), EventLoopClosed> {
            Ok(())
        }
    }

    fn null_dialog(rt: &tokio::runtime::Runtime) -> TaskDialog<(), NullView> {
        TaskDialog::new(UiBridge::new(NullEventLoop, rt.handle().clone()))
    }

    #[test]
    fn test_set_auto_close_stores_delay() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut dialog = null_dialog(&rt);

        dialog.set_auto_close(true, Duration::from_millis(250));
        assert!(dialog.options.auto_close);
        assert_eq!(dialog.options.auto_close_delay_ms, 250);
        assert_eq!(
            dialog.options.auto_close_delay(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_set_auto_close_saturates_oversized_delay() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut dialog = null_dialog(&rt);

        // Duration::MAX is more milliseconds than u64 can hold
        dialog.set_auto_close(true, Duration::MAX);
        assert_eq!(dialog.options.auto_close_delay_ms, u64::MAX);
    }
}
