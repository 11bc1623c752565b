use anyhow::Result;
use std::fmt;

/// A single unit of work paired with its display label.
///
/// The operation is an opaque fallible callable. It is consumed exactly once
/// by the worker thread and is never mutated after being enqueued. `T` is the
/// value type produced on success; failures are reported as [`anyhow::Error`]
/// so task bodies can use `?` freely.
pub struct TaskDescriptor<T> {
    /// The work to execute on the worker thread
    operation: Box<dyn FnOnce() -> Result<T> + Send>,

    /// Human-readable label, used only for display and diagnostics
    description: String,
}

impl<T> TaskDescriptor<T> {
    /// Create a new task descriptor.
    ///
    /// # Arguments
    /// * `description` - Label shown in the progress dialog while this task runs
    /// * `operation` - The work itself; runs once on the worker thread
    pub fn new<F>(description: impl Into<String>, operation: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            operation: Box::new(operation),
            description: description.into(),
        }
    }

    /// Get the display label for this task.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Split the descriptor into its label and operation for execution.
    pub(crate) fn into_parts(self) -> (String, Box<dyn FnOnce() -> Result<T> + Send>) {
        (self.description, self.operation)
    }
}

impl<T> fmt::Debug for TaskDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of tasks, fixed at construction time.
///
/// Execution order is queue order; there is no reordering and no priority.
/// The queue is consumed by value when a run starts, so no insertion is
/// possible while the worker is executing it.
///
/// # Example
/// ```
/// use rundialog::TaskQueue;
///
/// let queue = TaskQueue::new()
///     .task("Loading index", || Ok(1))
///     .task("Scanning files", || Ok(2));
/// assert_eq!(queue.len(), 2);
/// ```
pub struct TaskQueue<T> {
    tasks: Vec<TaskDescriptor<T>>,
}

impl<T> TaskQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append a task, builder-style.
    pub fn task<F>(mut self, description: impl Into<String>, operation: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        self.tasks.push(TaskDescriptor::new(description, operation));
        self
    }

    /// Append an already-built descriptor.
    pub fn push(&mut self, descriptor: TaskDescriptor<T>) {
        self.tasks.push(descriptor);
    }

    /// Number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the queue holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Display labels in queue order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.description()).collect()
    }

    /// Consume the queue for execution.
    pub(crate) fn into_tasks(self) -> Vec<TaskDescriptor<T>> {
        self.tasks
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("descriptions", &self.descriptions())
            .finish()
    }
}
