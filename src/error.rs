//! Error types used by the appvisor runtime, bus, and providers.
//!
//! This module defines the error enums for each failure channel:
//!
//! - [`RuntimeError`] — failures of the lifecycle machinery itself.
//! - [`TaskError`] — failures of individual startup task executions.
//! - [`BusError`] — rejected registrations on the request channel.
//! - [`CreateError`] — expected provider-creation failures.
//! - [`MigrateError`] — invalid per-provider data migrations.
//!
//! Types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Programmer errors (publishing a never-defined event kind, redefining a kind
//! with a different signature) are not represented here: they panic with a
//! loud diagnostic instead of flowing through a result channel.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the lifecycle runtime.
///
/// These represent failures of the application machinery, not of individual
/// startup tasks. A [`RuntimeError::FatalPrecondition`] is never retried:
/// a restart would re-fail identically, so the lifecycle terminates with a
/// non-zero exit status instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A startup precondition required for any further progress failed
    /// (e.g. the native windowing subsystem cannot initialize).
    #[error("fatal precondition failed: {reason}")]
    FatalPrecondition {
        /// Description of the precondition that failed.
        reason: String,
    },

    /// The frontend's main loop terminated abnormally.
    #[error("frontend terminated abnormally: {reason}")]
    Frontend {
        /// The underlying failure message.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use appvisor::RuntimeError;
    ///
    /// let err = RuntimeError::FatalPrecondition { reason: "no display".into() };
    /// assert_eq!(err.as_label(), "runtime_fatal_precondition");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::FatalPrecondition { .. } => "runtime_fatal_precondition",
            RuntimeError::Frontend { .. } => "runtime_frontend_failed",
        }
    }

    /// Returns the process exit status for this error.
    ///
    /// The process entry boundary maps a completed lifecycle to `0` and any
    /// [`RuntimeError`] to a non-zero status.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeError::FatalPrecondition { .. } => 2,
            RuntimeError::Frontend { .. } => 1,
        }
    }
}

/// # Errors produced by startup task execution.
///
/// A failed task never aborts the splash phase: the failure is recorded as a
/// degraded-start marker and the lifecycle proceeds so the user sees
/// actionable diagnostics instead of a silent exit.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution exceeded its timeout duration.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled because the splash phase deadline expired.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// True if this failure should mark the start as degraded.
    ///
    /// Cancellation is a graceful stop (phase deadline expired), not a task
    /// malfunction, so it does not count.
    pub fn is_degrading(&self) -> bool {
        !matches!(self, TaskError::Canceled)
    }
}

/// # Rejected registrations on the request channel.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BusError {
    /// A handler is already installed for this request kind.
    ///
    /// Request kinds have exactly one answering subscriber; a second
    /// registration is rejected and does **not** replace the first.
    #[error("request kind `{kind}` already has a handler")]
    HandlerExists {
        /// Name of the request kind.
        kind: &'static str,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::HandlerExists { .. } => "bus_handler_exists",
        }
    }
}

/// # Expected provider-creation failures.
///
/// Reported through the request/response `success=false` channel. The caller
/// decides whether to log (suppressible via `no_error_log` for
/// expected-failure probing, e.g. trying several factories in turn).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CreateError {
    /// No factory is registered under this unlocalized name.
    #[error("unknown provider factory `{name}`")]
    UnknownFactory {
        /// The name that failed to resolve.
        name: String,
    },

    /// The factory's configuration step failed.
    #[error("provider configuration failed: {reason}")]
    Configure {
        /// The underlying failure message.
        reason: String,
    },

    /// The factory failed to load the provider.
    #[error("provider load failed: {reason}")]
    Load {
        /// The underlying failure message.
        reason: String,
    },

    /// The loaded provider failed validation.
    #[error("provider validation failed: {reason}")]
    Validate {
        /// The underlying failure message.
        reason: String,
    },
}

impl CreateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use appvisor::CreateError;
    ///
    /// let err = CreateError::UnknownFactory { name: "disk".into() };
    /// assert_eq!(err.as_label(), "create_unknown_factory");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CreateError::UnknownFactory { .. } => "create_unknown_factory",
            CreateError::Configure { .. } => "create_configure_failed",
            CreateError::Load { .. } => "create_load_failed",
            CreateError::Validate { .. } => "create_validate_failed",
        }
    }
}

/// # Invalid per-provider data migrations.
///
/// Migration failures are reported loudly (diagnostic, never silent): the
/// move-data subscriber logs them at error level before discarding the
/// publication.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MigrateError {
    /// The source handle does not resolve to a live provider.
    #[error("migration source handle {0} is not a live provider")]
    UnknownSource(u64),

    /// The target handle does not resolve to a live provider.
    #[error("migration target handle {0} is not a live provider")]
    UnknownTarget(u64),

    /// Source and target are the same provider.
    #[error("migration source and target are the same provider ({0})")]
    SameProvider(u64),
}

impl MigrateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            MigrateError::UnknownSource(_) => "migrate_unknown_source",
            MigrateError::UnknownTarget(_) => "migrate_unknown_target",
            MigrateError::SameProvider(_) => "migrate_same_provider",
        }
    }
}
