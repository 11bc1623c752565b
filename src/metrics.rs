// Performance metrics module
//
// Provides lightweight metrics tracking for monitoring runner and dialog activity

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Process-wide metrics instance.
pub fn global() -> &'static Metrics {
    static METRICS: OnceLock<Metrics> = OnceLock::new();
    METRICS.get_or_init(Metrics::new)
}

/// Global performance metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Counters are recorded by the runner, dialog, and bridge as runs execute
/// and can be logged on shutdown for performance analysis.
#[derive(Debug)]
pub struct Metrics {
    /// Tasks that returned successfully
    pub tasks_completed: AtomicUsize,

    /// Tasks that failed or panicked (at most one per run)
    pub tasks_failed: AtomicUsize,

    /// Runs that reached the completed terminal state
    pub runs_completed: AtomicUsize,

    /// Runs that reached the failed terminal state
    pub runs_failed: AtomicUsize,

    /// Runs cancelled by the user
    pub runs_cancelled: AtomicUsize,

    /// View updates delivered to the bridge
    pub ui_updates: AtomicU64,

    /// View updates dropped (channel full or handler stopped)
    pub ui_updates_dropped: AtomicU64,

    /// Process start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            tasks_completed: AtomicUsize::new(0),
            tasks_failed: AtomicUsize::new(0),
            runs_completed: AtomicUsize::new(0),
            runs_failed: AtomicUsize::new(0),
            runs_cancelled: AtomicUsize::new(0),
            ui_updates: AtomicU64::new(0),
            ui_updates_dropped: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successful task
    pub fn record_task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed task
    pub fn record_task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run that completed successfully
    pub fn record_run_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run aborted by a task failure
    pub fn record_run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run cancelled by the user
    pub fn record_run_cancelled(&self) {
        self.runs_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a view update delivered to the bridge
    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped view update
    pub fn record_ui_update_dropped(&self) {
        self.ui_updates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Performance Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Tasks: {} completed, {} failed",
            self.tasks_completed.load(Ordering::Relaxed),
            self.tasks_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Runs: {} completed, {} failed, {} cancelled",
            self.runs_completed.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed),
            self.runs_cancelled.load(Ordering::Relaxed)
        );
        tracing::info!(
            "UI updates: {}, dropped: {}",
            self.ui_updates.load(Ordering::Relaxed),
            self.ui_updates_dropped.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
