// UiBridge - Coordinates between worker/listener threads and the host's UI event loop
//
// This solves the challenge of running two event loops:
// 1. The host toolkit's single-threaded GUI event loop
// 2. The worker and listener threads (plus tokio for timers)
//
// The bridge provides:
// - Safe view updates from any thread via the host's EventLoop handle
// - Spawning async timer tasks from dialog code
// - Thread-safe marshaling: view closures are queued and executed only on
//   the UI thread, never invoked directly from the worker side

use crate::metrics;
use std::future::Future;
use thiserror::Error;
use tokio::sync::mpsc;

/// Boxed view mutation, executed on the UI thread.
pub type ViewUpdate<V> = Box<dyn FnOnce(&V) + Send>;

/// Returned by [`EventLoop::post`] once the host's event loop has shut down.
#[derive(Error, Debug)]
#[error("UI event loop has shut down")]
pub struct EventLoopClosed;

/// Host-supplied handle onto a toolkit's UI event loop.
///
/// Implementations must run the posted closure on the UI thread (for Slint
/// this is `Weak::upgrade_in_event_loop`, for Qt-style toolkits a queued
/// invocation; tests use a plain channel drained by a designated thread).
/// Ordering must be preserved: updates posted in sequence run in sequence.
pub trait EventLoop<V>: Send + 'static {
    /// Queue `update` to run on the UI thread.
    fn post(&self, update: ViewUpdate<V>) -> Result<(), EventLoopClosed>;
}

/// Marshals view updates onto the UI thread and timers onto tokio.
///
/// Updates flow through a bounded channel (capacity 100) into a handler
/// thread which forwards them to the host's [`EventLoop`]. Bounding the
/// channel keeps memory flat if the UI lags; excess updates are dropped with
/// a warning rather than blocking the worker side.
///
/// # Example
/// ```ignore
/// let bridge = UiBridge::new(my_event_loop, runtime.handle().clone());
/// bridge.update_ui(|view| view.set_status("Loading..."));
/// ```
pub struct UiBridge<V> {
    /// Channel into the handler thread; bounded to 100 pending updates
    update_tx: mpsc::Sender<ViewUpdate<V>>,

    /// Handle to the tokio runtime for auto-close timers
    tokio_handle: tokio::runtime::Handle,
}

impl<V: 'static> UiBridge<V> {
    /// Create a bridge over the host's event loop.
    ///
    /// Spawns the handler thread that drains queued updates and posts them
    /// to `event_loop`. The thread exits once the event loop reports itself
    /// closed or every bridge clone has been dropped.
    pub fn new<L: EventLoop<V>>(event_loop: L, tokio_handle: tokio::runtime::Handle) -> Self {
        let (update_tx, mut update_rx) = mpsc::channel::<ViewUpdate<V>>(100);

        std::thread::spawn(move || {
            tracing::debug!("UiBridge handler thread started");

            while let Some(update) = update_rx.blocking_recv() {
                if event_loop.post(update).is_err() {
                    tracing::warn!("UI event loop closed - stopping view updates");
                    break;
                }
            }

            tracing::debug!("UiBridge handler thread terminated");
        });

        Self {
            update_tx,
            tokio_handle,
        }
    }

    /// Schedule a view update from any thread.
    ///
    /// The update is queued and executed on the UI thread. If the channel is
    /// full (UI lagging badly) or the handler has stopped, the update is
    /// dropped; progress updates are idempotent so a dropped frame is
    /// recovered by the next one.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&V) + Send + 'static,
    {
        match self.update_tx.try_send(Box::new(update)) {
            Ok(()) => metrics::global().record_ui_update(),
            Err(mpsc::error::TrySendError::Full(_)) => {
                metrics::global().record_ui_update_dropped();
                tracing::warn!("View update channel full - skipping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                metrics::global().record_ui_update_dropped();
                tracing::warn!("Failed to send view update - handler thread has stopped");
            }
        }
    }

    /// Spawn an async task on the tokio runtime (used for auto-close timers).
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }
}

// Manual Clone implementation to avoid requiring V: Clone
impl<V> Clone for UiBridge<V> {
    fn clone(&self) -> Self {
        Self {
            update_tx: self.update_tx.clone(),
            tokio_handle: self.tokio_handle.clone(),
        }
    }
}
