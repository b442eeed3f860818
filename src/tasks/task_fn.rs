//! # Function-backed startup task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(Arc<AppContext>, CancellationToken) -> Fut`,
//! producing a fresh future per run. Shared state across runs must be
//! explicit (`Arc<...>` captured by the closure).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use appvisor::{AppContext, TaskFn, TaskRef, TaskError};
//!
//! let t: TaskRef = TaskFn::arc("warm-cache", |_ctx: Arc<AppContext>, cancel: CancellationToken| async move {
//!     if cancel.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     // fill caches...
//!     Ok(())
//! });
//!
//! assert_eq!(t.name(), "warm-cache");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::AppContext;
use crate::error::TaskError;
use crate::tasks::task::StartupTask;

/// Function-backed startup task implementation.
///
/// Wraps a closure that *creates* a new future per run.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle (`Arc<Self>`).
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> StartupTask for TaskFn<F>
where
    F: Fn(Arc<AppContext>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: Arc<AppContext>, cancel: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx, cancel).await
    }
}
