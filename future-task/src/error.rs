//! Errors reported by the blocking fetch.
//!
//! Every call to [`FutureTask::get`](crate::FutureTask::get) resolves to a
//! value or to exactly one [`TaskError`]. Races on the internal state are
//! retried inside the task and never surface here.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// The ways a blocking fetch can fail.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// The task was cancelled before its computation completed.
    #[error("task was cancelled")]
    Cancelled,

    /// The computation failed; the cause is kept for inspection.
    #[error("task computation failed: {0}")]
    Execution(#[source] Cause),

    /// The deadline of a timed fetch elapsed first.
    ///
    /// The task itself is unaffected and may still complete later.
    #[error("timed out waiting for the task to complete")]
    Timeout,

    /// The waiting thread was interrupted while blocked.
    #[error("interrupted while waiting for the task to complete")]
    Interrupted,
}

impl From<Interrupted> for TaskError {
    fn from(_: Interrupted) -> Self {
        TaskError::Interrupted
    }
}

/// The captured reason a computation failed.
///
/// The cause is reference-counted so every caller of `get` observes the same
/// error instance.
#[derive(Clone)]
pub struct Cause {
    inner: Arc<dyn Error + Send + Sync + 'static>,
}

impl Cause {
    /// Wraps an error returned by a computation.
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Converts a panic payload caught around a computation.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new(Panicked::from_payload(payload))
    }

    /// Returns the underlying error.
    pub fn get_ref(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.inner
    }

    /// Attempts to downcast the underlying error to a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        self.inner.downcast_ref::<E>()
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl Error for Cause {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

/// A computation panicked instead of returning.
///
/// Panics such as integer division by zero are caught by the task and
/// reported to callers as [`TaskError::Execution`] with this cause.
#[derive(Debug, Clone, Error)]
#[error("computation panicked: {message}")]
pub struct Panicked {
    message: String,
}

impl Panicked {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast_ref::<&'static str>() {
                Some(message) => (*message).to_owned(),
                None => "non-string panic payload".to_owned(),
            },
        };

        Self { message }
    }

    /// The panic message, when the payload was a string.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The current thread observed a pending interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("thread was interrupted")]
pub struct Interrupted;
