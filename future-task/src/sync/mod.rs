//! Lock-free synchronization used by tasks.
//!
//! The only primitive so far is the waiter queue: an intrusive stack of
//! threads blocked on a task's outcome, drained once when the task reaches a
//! terminal state.

mod waiters;

pub(crate) use waiters::{WaitNode, WaitQueue};
