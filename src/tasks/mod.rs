//! # Startup task abstractions.
//!
//! This module provides the task-related types used by the splash phase:
//! - [`StartupTask`] - trait for implementing async cancelable startup work
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn StartupTask>`)

mod task;
mod task_fn;

pub use task::{StartupTask, TaskRef};
pub use task_fn::TaskFn;
