//! Data models for the task-runner dialog.
//!
//! This module contains the value types that flow between the caller, the
//! worker thread, and the dialog adapter:
//! - [`TaskDescriptor`]: immutable pairing of an opaque fallible operation with a display label
//! - [`TaskQueue`]: ordered sequence of descriptors, fixed at construction time
//! - [`DialogOptions`]: the dialog's configuration surface (auto-close behavior)
//!
//! # Architecture Note
//!
//! Queues and descriptors are consumed by value when a run starts, so no
//! mutation is possible while the worker is executing them. One queue, one
//! runner, one run: nothing here is reset and reused across runs.

pub mod options;
pub mod task;

pub use options::{DEFAULT_AUTO_CLOSE_DELAY_MS, DialogOptions, ERROR_CLOSE_DELAY};
pub use task::{TaskDescriptor, TaskQueue};
