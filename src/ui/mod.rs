// UI module - dialog adapter and event loop bridge
//
// This module contains:
// - ProgressView: the rendering-surface contract the host implements
// - UiBridge / EventLoop: marshaling of view updates onto the UI thread
// - TaskDialog: owns a runner per run and drives the view from its events

pub mod bridge;
pub mod dialog;
pub mod view;

pub use bridge::{EventLoop, EventLoopClosed, UiBridge, ViewUpdate};
pub use dialog::{CompleteCallback, ErrorCallback, TaskDialog};
pub use view::ProgressView;
