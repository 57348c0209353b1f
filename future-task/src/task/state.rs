//! Task lifecycle states.
//!
//! The state register only ever moves forward:
//!
//! ```text
//! NEW -> COMPLETING -> NORMAL
//!  |            \
//!  |             +--> EXCEPTIONAL
//!  +--> CANCELLED
//!  +--> INTERRUPTING -> INTERRUPTED
//! ```
//!
//! The numeric order is meaningful: every value above `COMPLETING` is
//! terminal except `INTERRUPTING`, and every value from `CANCELLED` upward
//! belongs to the cancelled family.

/// Task has not completed and has not been cancelled.
///
/// The computation may or may not be running.
pub(crate) const NEW: usize = 0;

/// The computation returned and its outcome is being published.
///
/// This window is always transient.
pub(crate) const COMPLETING: usize = 1;

/// The computation returned a value.
pub(crate) const NORMAL: usize = 2;

/// The computation failed and its cause is stored.
pub(crate) const EXCEPTIONAL: usize = 3;

/// The task was cancelled without interrupting the runner.
pub(crate) const CANCELLED: usize = 4;

/// The task was cancelled and an interrupt is being delivered to the runner.
pub(crate) const INTERRUPTING: usize = 5;

/// The task was cancelled and the interrupt has been delivered.
pub(crate) const INTERRUPTED: usize = 6;

/// A snapshot of a task's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Not yet completed or cancelled.
    New,
    /// Outcome being published.
    Completing,
    /// Completed with a value.
    Normal,
    /// Completed with a failure.
    Exceptional,
    /// Cancelled without interruption.
    Cancelled,
    /// Cancelled, interrupt in flight.
    Interrupting,
    /// Cancelled, interrupt delivered.
    Interrupted,
}

impl TaskState {
    pub(crate) fn from_raw(raw: usize) -> Self {
        match raw {
            NEW => TaskState::New,
            COMPLETING => TaskState::Completing,
            NORMAL => TaskState::Normal,
            EXCEPTIONAL => TaskState::Exceptional,
            CANCELLED => TaskState::Cancelled,
            INTERRUPTING => TaskState::Interrupting,
            _ => TaskState::Interrupted,
        }
    }

    /// Returns `true` if no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Normal
                | TaskState::Exceptional
                | TaskState::Cancelled
                | TaskState::Interrupted
        )
    }

    /// Returns `true` for the cancelled family.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            TaskState::Cancelled | TaskState::Interrupting | TaskState::Interrupted
        )
    }
}
