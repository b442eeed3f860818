//! # Startup task abstraction.
//!
//! This module defines the [`StartupTask`] trait (async, cancelable). The
//! common handle type is [`TaskRef`], an `Arc<dyn StartupTask>` suitable for
//! sharing across the runtime.
//!
//! A task receives the fresh [`AppContext`](crate::AppContext) of the current
//! lifecycle iteration and a [`CancellationToken`]; it should periodically
//! check the token to stop cooperatively when the splash deadline expires.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::AppContext;
use crate::error::TaskError;

/// # Asynchronous, cancelable startup unit.
///
/// A `StartupTask` has a stable [`name`](StartupTask::name) and an async
/// [`run`](StartupTask::run) method. Tasks run concurrently during the
/// splash phase; a failure records a degraded-start marker but never aborts
/// the phase.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use appvisor::{AppContext, StartupTask, TaskError};
///
/// struct LoadSettings;
///
/// #[async_trait]
/// impl StartupTask for LoadSettings {
///     fn name(&self) -> &str { "load-settings" }
///
///     async fn run(
///         &self,
///         _ctx: Arc<AppContext>,
///         cancel: CancellationToken,
///     ) -> Result<(), TaskError> {
///         if cancel.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // read settings...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait StartupTask: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    ///
    /// Implementations should check `cancel.is_cancelled()` and exit quickly
    /// (returning [`TaskError::Canceled`]) once the splash deadline expires.
    async fn run(&self, ctx: Arc<AppContext>, cancel: CancellationToken) -> Result<(), TaskError>;
}

/// Shared reference to a startup task.
pub type TaskRef = Arc<dyn StartupTask>;
