//! Per-thread interrupt status.
//!
//! Rust threads cannot be stopped from the outside, so interruption is
//! advisory: an interrupt sets a flag on the target thread and unparks it.
//! Code that wants to be cancellable observes the flag, either directly with
//! [`is_interrupted`] or through blocking helpers such as [`sleep`] and
//! [`FutureTask::get`](crate::FutureTask::get), which fail fast once the flag
//! is set.
//!
//! Every thread owns one [`Parker`]. Blocked task waiters park on it and
//! interrupts unpark it, so an interrupt always reaches a blocked thread. An
//! unpark that arrives before the park call is remembered as a token and the
//! next park returns immediately.

use crate::error::Interrupted;

use crossbeam_utils::sync::{Parker, Unparker};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Interrupt record shared between a thread and whoever may interrupt it.
pub(crate) struct Interrupter {
    /// Pending interrupt request.
    flag: AtomicBool,

    /// Unparks the owning thread's parker.
    unparker: Unparker,
}

impl Interrupter {
    /// Sets the interrupt flag, then wakes the owning thread if it is parked.
    pub(crate) fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.unparker.unpark();
    }

    fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn clear(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

thread_local! {
    /// Parker of the current thread.
    static PARKER: Parker = Parker::new();

    /// Interrupt record of the current thread, created on first use.
    static CURRENT: Arc<Interrupter> = Arc::new(Interrupter {
        flag: AtomicBool::new(false),
        unparker: PARKER.with(|parker| parker.unparker().clone()),
    });
}

/// A handle able to interrupt one particular thread.
///
/// Handles are cheap to clone and may be sent to other threads.
#[derive(Clone)]
pub struct InterruptHandle {
    inner: Arc<Interrupter>,
}

impl InterruptHandle {
    /// Requests that the thread stop what it is doing.
    ///
    /// The thread is unparked so that a blocked [`FutureTask::get`](crate::FutureTask::get)
    /// or [`sleep`] notices the request immediately.
    pub fn interrupt(&self) {
        self.inner.interrupt();
    }

    /// Returns `true` if an interrupt is pending on the thread.
    pub fn is_interrupted(&self) -> bool {
        self.inner.is_interrupted()
    }
}

impl fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptHandle")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// Returns a handle able to interrupt the current thread.
pub fn current() -> InterruptHandle {
    InterruptHandle {
        inner: current_interrupter(),
    }
}

/// Returns `true` if an interrupt is pending on the current thread.
///
/// The flag is left untouched.
pub fn is_interrupted() -> bool {
    CURRENT.with(|current| current.is_interrupted())
}

/// Tests and clears the interrupt flag of the current thread.
///
/// Returns `true` if an interrupt was pending.
pub fn interrupted() -> bool {
    CURRENT.with(|current| current.clear())
}

/// Puts the current thread to sleep for at least `duration`, unless it is
/// interrupted first.
///
/// On interruption the flag is cleared and [`Interrupted`] is returned, so
/// computations can use `?` to bail out when their task is cancelled.
///
/// # Examples
///
/// ```rust
/// use future_task::interrupt;
/// use std::time::Duration;
///
/// interrupt::current().interrupt();
/// assert!(interrupt::sleep(Duration::from_secs(60)).is_err());
/// assert!(!interrupt::is_interrupted());
/// ```
pub fn sleep(duration: Duration) -> Result<(), Interrupted> {
    let Some(deadline) = Instant::now().checked_add(duration) else {
        loop {
            if interrupted() {
                return Err(Interrupted);
            }
            park();
        }
    };

    loop {
        if interrupted() {
            return Err(Interrupted);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }

        park_timeout(deadline - now);
    }
}

pub(crate) fn current_interrupter() -> Arc<Interrupter> {
    CURRENT.with(Arc::clone)
}

/// Unparker for the current thread, handed to wait-nodes.
pub(crate) fn unparker() -> Unparker {
    PARKER.with(|parker| parker.unparker().clone())
}

/// Blocks the current thread until it is unparked.
pub(crate) fn park() {
    PARKER.with(|parker| parker.park());
}

/// Blocks the current thread until it is unparked or `timeout` elapses.
pub(crate) fn park_timeout(timeout: Duration) {
    PARKER.with(|parker| parker.park_timeout(timeout));
}
