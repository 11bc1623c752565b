// Dialog run-phase tracking
//
// This module provides the PhaseTracker which wraps the dialog's run phase
// with thread-safe access using Arc<Mutex<T>>, shared between the owner
// thread and the event-listener thread.

use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Visual progress state machine of a [`TaskDialog`](crate::ui::TaskDialog).
///
/// `Idle → Running → {Completed, Failed, Cancelled}`. Terminal phases are
/// never left; a new run requires a fresh dialog and runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    /// Constructed, or tasks set but no run started yet
    Idle,
    /// Worker thread is executing the queue
    Running,
    /// All tasks completed; completion callback has fired
    Completed,
    /// A task failed; error callback has fired
    Failed,
    /// User cancelled while running; no callback fires
    Cancelled,
}

impl DialogPhase {
    /// Whether this phase ends the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Errors from invalid phase transitions.
#[derive(Error, Debug)]
pub enum PhaseError {
    #[error("run cannot start from phase {0:?}")]
    NotIdle(DialogPhase),
}

/// Thread-safe phase cell shared between the owner and listener threads.
///
/// [`try_finish`](Self::try_finish) is the exactly-once guard for terminal
/// outcomes: only the caller that wins the `Running → terminal` transition
/// may invoke a completion or error callback. A cancellation racing a
/// terminal event therefore suppresses the callback, and vice versa.
#[derive(Clone)]
pub struct PhaseTracker {
    phase: Arc<Mutex<DialogPhase>>,
}

impl PhaseTracker {
    /// Create a tracker in [`DialogPhase::Idle`].
    pub fn new() -> Self {
        Self {
            phase: Arc::new(Mutex::new(DialogPhase::Idle)),
        }
    }

    /// Get the current phase.
    pub fn current(&self) -> DialogPhase {
        *self.phase.lock().unwrap()
    }

    /// Transition `Idle → Running`.
    pub fn begin_run(&self) -> Result<(), PhaseError> {
        let mut phase = self.phase.lock().unwrap();
        if *phase != DialogPhase::Idle {
            return Err(PhaseError::NotIdle(*phase));
        }
        *phase = DialogPhase::Running;
        tracing::debug!("Dialog phase: Idle -> Running");
        Ok(())
    }

    /// Transition `Running → terminal`, returning whether this call won.
    ///
    /// Returns `false` when the run is not in `Running` (not started, or
    /// another terminal outcome got there first).
    pub fn try_finish(&self, terminal: DialogPhase) -> bool {
        debug_assert!(terminal.is_terminal());
        let mut phase = self.phase.lock().unwrap();
        if *phase != DialogPhase::Running {
            return false;
        }
        tracing::debug!("Dialog phase: Running -> {:?}", terminal);
        *phase = terminal;
        true
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
