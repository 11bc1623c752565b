// ProgressView - rendering surface contract for the task dialog
//
// The crate bundles no GUI toolkit. The host implements this trait over
// whatever widget set it uses (a label, a determinate progress bar, a cancel
// button) and the dialog drives it through the UiBridge, which guarantees
// every call lands on the UI thread.

/// Rendering surface driven by [`TaskDialog`](crate::ui::TaskDialog).
///
/// All methods are invoked on the UI thread only; implementations never need
/// their own synchronization.
pub trait ProgressView {
    /// Show the description of the task currently executing.
    fn set_status(&self, text: &str);

    /// Update the determinate progress indicator (`current` of `total`).
    fn set_progress(&self, current: usize, total: usize);

    /// Render the success terminal state ("Processing complete").
    fn show_complete(&self);

    /// Render the failure terminal state with the error text.
    fn show_error(&self, message: &str);

    /// Dismiss the dialog.
    fn close(&self);
}
