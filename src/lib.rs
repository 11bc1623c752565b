// rundialog - Sequential background task runner with progress-dialog plumbing
//
// This is a library crate: applications supply the actual widgets (via the
// ProgressView trait and an EventLoop handle) and rundialog supplies the
// worker thread, event stream, cancellation, and terminal-callback plumbing.

pub mod logging;
pub mod metrics;
pub mod models;
pub mod runner;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use models::{DialogOptions, ERROR_CLOSE_DELAY, TaskDescriptor, TaskQueue};
pub use runner::{RunnerError, RunnerEvent, TaskRunner};
pub use state::{DialogPhase, PhaseTracker};
pub use ui::{EventLoop, ProgressView, TaskDialog, UiBridge};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
