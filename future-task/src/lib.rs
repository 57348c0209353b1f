//! # future-task
//!
//! **future-task** provides a single-assignment, cancellable result cell for
//! thread-based executors in the **Nebula** ecosystem.
//!
//! A [`FutureTask`] wraps a one-shot computation. An executor invokes
//! [`FutureTask::run`] exactly once on a worker thread, while any number of
//! other threads block in [`FutureTask::get`] or [`FutureTask::get_timeout`]
//! until the value, the failure, or the cancellation becomes visible.
//!
//! The cell is built around:
//!
//! - an **atomic state machine** deciding, with a single compare-and-swap,
//!   whether completion or cancellation wins,
//! - a **lock-free waiter queue** of parked threads, drained exactly once,
//! - **advisory interruption**, letting [`FutureTask::cancel`] signal the
//!   thread that runs the computation.
//!
//! ## Quick Start
//!
//! ```rust
//! use future_task::FutureTask;
//! use std::sync::Arc;
//!
//! let task = Arc::new(FutureTask::new(|| 2 + 3));
//! let worker = future_task::task::spawn(task.clone()).unwrap();
//!
//! assert_eq!(*task.get().unwrap(), 5);
//! worker.join().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`task`]: the task cell, its builder, and a thread spawn helper
//! - [`interrupt`]: per-thread interrupt status and interruptible sleep
//! - [`error`]: errors reported by the blocking fetch

mod future;
mod sync;

pub mod error;
pub mod interrupt;
pub mod task;

pub use error::{Cause, Interrupted, Panicked, TaskError};
pub use future::{Future, Runnable, RunnableFuture};
pub use task::{FutureTask, TaskBuilder, TaskState};
