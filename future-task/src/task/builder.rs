use super::core::{Computation, DoneHook, FutureTask};
use crate::error::Cause;

use std::error::Error;

/// Builder for configuring and creating a [`FutureTask`].
///
/// `TaskBuilder` allows attaching a name and a completion hook before the
/// computation is supplied.
///
/// # Examples
///
/// ```rust
/// use future_task::FutureTask;
///
/// let task = FutureTask::builder()
///     .name("answer")
///     .on_done(|task| println!("{:?} finished", task.name()))
///     .build(|| 42);
///
/// task.run();
/// assert_eq!(*task.get().unwrap(), 42);
/// ```
pub struct TaskBuilder<V> {
    /// Label used in logs, `Debug` output and spawned thread names.
    name: Option<String>,

    /// Invoked once when the task reaches a terminal state.
    on_done: Option<DoneHook<V>>,
}

impl<V: Send + 'static> TaskBuilder<V> {
    /// Creates a builder with no name and no completion hook.
    pub fn new() -> Self {
        Self {
            name: None,
            on_done: None,
        }
    }

    /// Names the task.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Registers a hook invoked exactly once when the task completes, fails,
    /// or is cancelled.
    ///
    /// The hook runs on the thread that publishes the outcome, after the
    /// outcome is visible and waiting threads were woken, and before the
    /// computation is released. A panicking hook is caught and logged.
    pub fn on_done<H>(mut self, hook: H) -> Self
    where
        H: FnOnce(&FutureTask<V>) + Send + 'static,
    {
        self.on_done = Some(Box::new(hook));
        self
    }

    /// Builds a task around an infallible computation.
    pub fn build<F>(self, computation: F) -> FutureTask<V>
    where
        F: FnOnce() -> V + Send + 'static,
    {
        self.finish(Box::new(move || Ok(computation())))
    }

    /// Builds a task around a computation that may return an error.
    pub fn build_fallible<F, E>(self, computation: F) -> FutureTask<V>
    where
        F: FnOnce() -> Result<V, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        self.finish(Box::new(move || computation().map_err(Cause::new)))
    }

    fn finish(self, computation: Computation<V>) -> FutureTask<V> {
        FutureTask::from_parts(self.name, computation, self.on_done)
    }
}

impl<V: Send + 'static> Default for TaskBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
