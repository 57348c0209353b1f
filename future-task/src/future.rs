use crate::error::TaskError;

use std::time::Duration;

/// The capability set of a blocking result cell.
///
/// Unlike [`std::future::Future`], this contract is thread-based: fetching
/// the result blocks the calling thread instead of registering a waker.
///
/// Implementations must make cancellation and completion mutually exclusive:
/// once any caller observes one of them, every caller observes the same one.
pub trait Future {
    /// The value produced by a successful computation.
    type Output;

    /// Attempts to cancel the computation.
    ///
    /// Returns `false` if the cell already completed, was already cancelled,
    /// or is publishing its outcome. When `may_interrupt_if_running` is
    /// `true`, the thread running the computation is interrupted.
    fn cancel(&self, may_interrupt_if_running: bool) -> bool;

    /// Returns `true` if the cell was cancelled before completing.
    fn is_cancelled(&self) -> bool;

    /// Returns `true` once the cell completed, failed, or was cancelled.
    fn is_done(&self) -> bool;

    /// Blocks until the outcome is available.
    fn get(&self) -> Result<&Self::Output, TaskError>;

    /// Blocks for at most `timeout` waiting for the outcome.
    fn get_timeout(&self, timeout: Duration) -> Result<&Self::Output, TaskError>;
}

/// A unit of work an executor can run.
///
/// The trait is object safe, allowing executors to queue heterogeneous
/// tasks as `Arc<dyn Runnable>`.
pub trait Runnable: Send + Sync {
    /// Executes the work on the calling thread.
    fn run(&self);
}

/// A result cell that is also the work producing its result.
pub trait RunnableFuture: Runnable + Future {}

impl<T> RunnableFuture for T where T: Runnable + Future + ?Sized {}
