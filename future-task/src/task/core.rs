use super::builder::TaskBuilder;
use super::runner::RunnerSlot;
use super::state::{
    CANCELLED, COMPLETING, EXCEPTIONAL, INTERRUPTED, INTERRUPTING, NEW, NORMAL, TaskState,
};
use crate::error::{Cause, TaskError};
use crate::future::{Future, Runnable};
use crate::interrupt;
use crate::sync::{WaitNode, WaitQueue};

use crossbeam_utils::Backoff;
use crossbeam_utils::atomic::AtomicCell;
use tracing::{debug, trace, warn};

use std::cell::UnsafeCell;
use std::error::Error;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// The boxed one-shot computation of a task.
pub(crate) type Computation<V> = Box<dyn FnOnce() -> Result<V, Cause> + Send>;

/// The boxed completion hook of a task.
pub(crate) type DoneHook<V> = Box<dyn FnOnce(&FutureTask<V>) + Send>;

/// Thin wrapper so the computation fits a single pointer-sized atomic cell.
struct Callable<V> {
    call: Computation<V>,
}

/// Thin wrapper so the hook fits a single pointer-sized atomic cell.
struct Hook<V> {
    call: DoneHook<V>,
}

/// The published result of a computation.
enum Outcome<V> {
    Value(V),
    Failure(Cause),
}

/// A single-assignment, cancellable result cell.
///
/// A `FutureTask` owns a one-shot computation. An executor calls
/// [`run`](Self::run) once on a worker thread; any number of threads may
/// concurrently call [`get`](Self::get), [`get_timeout`](Self::get_timeout),
/// [`cancel`](Self::cancel), [`is_done`](Self::is_done) and
/// [`is_cancelled`](Self::is_cancelled).
///
/// Completion and cancellation race on a single compare-and-swap of the
/// state register, so at most one of them ever becomes visible.
pub struct FutureTask<V> {
    /// The current lifecycle state (NEW, COMPLETING, NORMAL, ...).
    state: AtomicUsize,

    /// The value or failure cause.
    ///
    /// Written only by the thread that moves the state from NEW to
    /// COMPLETING, before the release store of the terminal state. Read only
    /// after an acquire load observed that terminal state.
    outcome: UnsafeCell<Option<Outcome<V>>>,

    /// The computation, taken by the runner or dropped on completion.
    callable: AtomicCell<Option<Box<Callable<V>>>>,

    /// Completion hook, taken by the thread that finalizes the task.
    on_done: AtomicCell<Option<Box<Hook<V>>>>,

    /// Interrupt handle of the thread executing the computation.
    runner: RunnerSlot,

    /// Threads blocked in `get`.
    waiters: WaitQueue,

    /// Optional label for logs and thread names.
    name: Option<String>,
}

// Safety: `outcome` is written by exactly one thread before a release store of
// the state and read only after an acquire load of a terminal state, so shared
// access only ever hands out `&V`.
unsafe impl<V: Send + Sync> Sync for FutureTask<V> {}

impl<V: Send + 'static> FutureTask<V> {
    /// Creates a task around an infallible computation.
    ///
    /// A panic inside the computation is caught and reported to callers of
    /// `get` as [`TaskError::Execution`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use future_task::FutureTask;
    ///
    /// let task = FutureTask::new(|| 2 + 3);
    /// task.run();
    /// assert_eq!(*task.get().unwrap(), 5);
    /// ```
    pub fn new<F>(computation: F) -> Self
    where
        F: FnOnce() -> V + Send + 'static,
    {
        TaskBuilder::new().build(computation)
    }

    /// Creates a task around a computation that may return an error.
    ///
    /// An `Err` is stored as the failure cause and surfaced by `get` as
    /// [`TaskError::Execution`].
    pub fn fallible<F, E>(computation: F) -> Self
    where
        F: FnOnce() -> Result<V, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        TaskBuilder::new().build_fallible(computation)
    }

    /// Creates a task that runs a side effect and then completes with
    /// `value`.
    pub fn with_result<F>(work: F, value: V) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        TaskBuilder::new().build(move || {
            work();
            value
        })
    }

    /// Returns a builder for a named task or a task with a completion hook.
    pub fn builder() -> TaskBuilder<V> {
        TaskBuilder::new()
    }
}

impl<V> FutureTask<V> {
    pub(crate) fn from_parts(
        name: Option<String>,
        computation: Computation<V>,
        on_done: Option<DoneHook<V>>,
    ) -> Self {
        Self {
            state: AtomicUsize::new(NEW),
            outcome: UnsafeCell::new(None),
            callable: AtomicCell::new(Some(Box::new(Callable { call: computation }))),
            on_done: AtomicCell::new(on_done.map(|call| Box::new(Hook { call }))),
            runner: RunnerSlot::new(),
            waiters: WaitQueue::new(),
            name,
        }
    }

    /// The name given through [`TaskBuilder::name`], if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns a snapshot of the lifecycle state.
    pub fn state(&self) -> TaskState {
        TaskState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` if the task was cancelled before completing.
    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) >= CANCELLED
    }

    /// Returns `true` once the task completed, failed, or was cancelled.
    pub fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) != NEW
    }

    /// Runs the computation on the calling thread.
    ///
    /// This is the entry point for executors. It does nothing if the task
    /// already ran, is running on another thread, or was cancelled.
    ///
    /// If the task is cancelled with interruption while the computation runs,
    /// this method does not return before the interrupt has been delivered,
    /// and then clears it from the calling thread. A pooled worker therefore
    /// never carries the interrupt into its next task.
    pub fn run(&self) {
        if self.state.load(Ordering::Acquire) != NEW
            || !self.runner.claim(interrupt::current_interrupter())
        {
            return;
        }

        if self.state.load(Ordering::Acquire) == NEW {
            if let Some(callable) = self.callable.take() {
                trace!(task = self.label(), "running computation");

                let Callable { call } = *callable;

                match panic::catch_unwind(AssertUnwindSafe(call)) {
                    Ok(Ok(value)) => self.set(value),
                    Ok(Err(cause)) => self.set_exception(cause),
                    Err(payload) => self.set_exception(Cause::from_panic(payload)),
                }
            }
        }

        // An empty slot means a canceller took the runner to interrupt it.
        let targeted = self.runner.take().is_none();

        let s = self.state.load(Ordering::Acquire);
        if s >= INTERRUPTING {
            self.handle_possible_cancellation_interrupt(s, targeted);
        }
    }

    /// Attempts to cancel the task.
    ///
    /// Returns `false` if the task already left the NEW state. On success all
    /// waiting threads are woken and observe [`TaskError::Cancelled`].
    ///
    /// With `may_interrupt_if_running`, the thread running the computation is
    /// interrupted. Interruption is advisory: the computation stops early
    /// only if it observes the interrupt, for instance through
    /// [`interrupt::sleep`].
    pub fn cancel(&self, may_interrupt_if_running: bool) -> bool {
        let target = if may_interrupt_if_running {
            INTERRUPTING
        } else {
            CANCELLED
        };

        if self.state.load(Ordering::Acquire) != NEW
            || self
                .state
                .compare_exchange(NEW, target, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            return false;
        }

        if may_interrupt_if_running {
            if let Some(runner) = self.runner.take() {
                trace!(task = self.label(), "interrupting runner");
                runner.interrupt();
            }

            self.state.store(INTERRUPTED, Ordering::Release);
        }

        debug!(
            task = self.label(),
            interrupt = may_interrupt_if_running,
            "task cancelled"
        );

        self.finish_completion();
        true
    }

    /// Blocks the calling thread until the task reaches a terminal state.
    ///
    /// # Errors
    ///
    /// - [`TaskError::Execution`] if the computation failed or panicked,
    /// - [`TaskError::Cancelled`] if the task was cancelled,
    /// - [`TaskError::Interrupted`] if the calling thread was interrupted
    ///   while waiting.
    pub fn get(&self) -> Result<&V, TaskError> {
        let mut s = self.state.load(Ordering::Acquire);

        if s <= COMPLETING {
            s = self.await_done(None)?;
        }

        self.report(s)
    }

    /// Blocks the calling thread for at most `timeout`.
    ///
    /// An expired timeout leaves the task untouched: the computation keeps
    /// running and a later call can still observe its outcome.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`TaskError::Timeout`] when the deadline
    /// elapses before the task completes.
    pub fn get_timeout(&self, timeout: Duration) -> Result<&V, TaskError> {
        let mut s = self.state.load(Ordering::Acquire);

        if s <= COMPLETING {
            // A deadline beyond the clock's range is as good as no deadline.
            let deadline = Instant::now().checked_add(timeout);

            s = self.await_done(deadline)?;

            if s <= COMPLETING {
                debug!(task = self.label(), ?timeout, "timed out waiting for task");
                return Err(TaskError::Timeout);
            }
        }

        self.report(s)
    }

    /// Publishes a value unless the task was cancelled or already completed.
    fn set(&self, value: V) {
        if self
            .state
            .compare_exchange(NEW, COMPLETING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // Safety: winning NEW -> COMPLETING grants exclusive write access.
            unsafe { *self.outcome.get() = Some(Outcome::Value(value)) };

            self.state.store(NORMAL, Ordering::Release);
            trace!(task = self.label(), "completed normally");

            self.finish_completion();
        }
    }

    /// Publishes a failure unless the task was cancelled or already completed.
    fn set_exception(&self, cause: Cause) {
        if self
            .state
            .compare_exchange(NEW, COMPLETING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!(task = self.label(), %cause, "computation failed");

            // Safety: winning NEW -> COMPLETING grants exclusive write access.
            unsafe { *self.outcome.get() = Some(Outcome::Failure(cause)) };

            self.state.store(EXCEPTIONAL, Ordering::Release);
            self.finish_completion();
        }
    }

    /// Spins until a concurrent `cancel(true)` finished delivering its
    /// interrupt, then clears that interrupt from the calling thread.
    fn handle_possible_cancellation_interrupt(&self, s: usize, targeted: bool) {
        if s == INTERRUPTING {
            let backoff = Backoff::new();

            while self.state.load(Ordering::Acquire) == INTERRUPTING {
                backoff.snooze();
            }
        }

        if targeted {
            interrupt::interrupted();
        }
    }

    /// Wakes all waiters, runs the completion hook and releases the
    /// computation. Called once, by the thread that reached a terminal state.
    fn finish_completion(&self) {
        let woken = self.waiters.drain();
        trace!(task = self.label(), woken, "waiters drained");

        if let Some(hook) = self.on_done.take() {
            let Hook { call } = *hook;

            if panic::catch_unwind(AssertUnwindSafe(|| call(self))).is_err() {
                warn!(task = self.label(), "completion hook panicked");
            }
        }

        drop(self.callable.take());
    }

    /// Waits for completion, interruption, or the deadline.
    ///
    /// Returns the state observed last, which is not terminal only when the
    /// deadline elapsed.
    fn await_done(&self, deadline: Option<Instant>) -> Result<usize, TaskError> {
        let mut node: Option<Arc<WaitNode>> = None;
        let mut queued = false;
        let backoff = Backoff::new();

        loop {
            if interrupt::interrupted() {
                if let Some(node) = &node {
                    self.waiters.remove(node);
                }

                debug!(task = self.label(), "interrupted while waiting");
                return Err(TaskError::Interrupted);
            }

            let s = self.state.load(Ordering::SeqCst);

            if s > COMPLETING {
                if let Some(node) = &node {
                    node.release();
                }

                return Ok(s);
            }

            if s == COMPLETING {
                backoff.snooze();
                continue;
            }

            let current = match &node {
                Some(current) => current,
                None => {
                    node = Some(Arc::new(WaitNode::current()));
                    continue;
                }
            };

            if !queued {
                self.waiters.push(Arc::clone(current));
                queued = true;
                continue;
            }

            match deadline {
                Some(deadline) => {
                    let now = Instant::now();

                    if now >= deadline {
                        self.waiters.remove(current);
                        return Ok(self.state.load(Ordering::SeqCst));
                    }

                    interrupt::park_timeout(deadline - now);
                }
                None => interrupt::park(),
            }
        }
    }

    /// Resolves a terminal state into the caller's result.
    fn report(&self, s: usize) -> Result<&V, TaskError> {
        if s >= CANCELLED {
            return Err(TaskError::Cancelled);
        }

        // Safety: `s` is NORMAL or EXCEPTIONAL and was read with acquire ordering, so
        // the outcome write is visible and will never change again.
        match unsafe { &*self.outcome.get() } {
            Some(Outcome::Value(value)) => Ok(value),
            Some(Outcome::Failure(cause)) => Err(TaskError::Execution(cause.clone())),
            None => unreachable!("terminal state {s} without an outcome"),
        }
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

impl<V: Send + Sync> Runnable for FutureTask<V> {
    fn run(&self) {
        FutureTask::run(self)
    }
}

impl<V> Future for FutureTask<V> {
    type Output = V;

    fn cancel(&self, may_interrupt_if_running: bool) -> bool {
        FutureTask::cancel(self, may_interrupt_if_running)
    }

    fn is_cancelled(&self) -> bool {
        FutureTask::is_cancelled(self)
    }

    fn is_done(&self) -> bool {
        FutureTask::is_done(self)
    }

    fn get(&self) -> Result<&V, TaskError> {
        FutureTask::get(self)
    }

    fn get_timeout(&self, timeout: Duration) -> Result<&V, TaskError> {
        FutureTask::get_timeout(self, timeout)
    }
}

impl<V> fmt::Debug for FutureTask<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state.load(Ordering::Acquire);

        let mut debug = f.debug_struct("FutureTask");
        if let Some(name) = &self.name {
            debug.field("name", name);
        }

        match s {
            NORMAL => debug.field("status", &"completed normally"),
            EXCEPTIONAL => {
                // Safety: see `report`.
                match unsafe { &*self.outcome.get() } {
                    Some(Outcome::Failure(cause)) => debug.field(
                        "status",
                        &format_args!("completed exceptionally: {cause}"),
                    ),
                    _ => debug.field("status", &"completed exceptionally"),
                }
            }
            CANCELLED | INTERRUPTING | INTERRUPTED => debug.field("status", &"cancelled"),
            _ => debug.field("status", &"not completed"),
        };

        debug.finish()
    }
}

/// Runs `task` once on a newly spawned thread.
///
/// The thread is named after the task when it has a name. This is a
/// convenience for tests and simple callers; executors with their own worker
/// threads call [`FutureTask::run`] directly.
///
/// # Errors
///
/// Returns the error from [`thread::Builder::spawn`] if the thread could not
/// be created.
pub fn spawn<V>(task: Arc<FutureTask<V>>) -> io::Result<JoinHandle<()>>
where
    V: Send + Sync + 'static,
{
    let mut builder = thread::Builder::new();

    if let Some(name) = task.name() {
        builder = builder.name(name.to_owned());
    }

    builder.spawn(move || task.run())
}
