//! Task primitives.
//!
//! This module defines the result cell and everything needed to configure
//! and run it:
//! - [`FutureTask`], the cell itself,
//! - [`TaskBuilder`], for naming a task or attaching a completion hook,
//! - [`TaskState`], a snapshot of the lifecycle state,
//! - [`spawn`], which runs a task on a dedicated thread.
//!
//! Executors drive tasks through [`FutureTask::run`]; callers observe them
//! through the blocking [`Future`](crate::Future) contract.

mod builder;
mod runner;

pub(crate) mod state;

pub mod core;

pub use builder::TaskBuilder;
pub use self::core::{FutureTask, spawn};
pub use state::TaskState;
