//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for the lifecycle runtime.
//!
//! Config is consumed by the [`LifecycleController`](crate::LifecycleController)
//! when driving the splash phase.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no global semaphore created)
//! - `task_timeout = 0s` → no per-task timeout
//! - `splash_deadline = 0s` → splash phase waits for all tasks

use std::time::Duration;

/// Global configuration for the lifecycle runtime.
///
/// Defines:
/// - **Concurrency limits**: max simultaneous startup tasks
/// - **Timeouts**: per-task attempt timeout
/// - **Splash behavior**: overall deadline for the startup phase
///
/// ## Field semantics
/// - `max_concurrent`: startup task concurrency limit (`0` = unlimited)
/// - `task_timeout`: per-task timeout (`0s` = no timeout)
/// - `splash_deadline`: maximum wall-clock time for the whole splash phase
///   (`0s` = wait for all tasks); on expiry the remaining tasks are cancelled
///   and recorded as degraded-start markers
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of startup tasks to run concurrently.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` tasks run simultaneously
    pub max_concurrent: usize,

    /// Per-task timeout for startup tasks.
    ///
    /// - `Duration::ZERO` = no timeout (task runs until completion)
    /// - `> 0` = timeout applied per task; expiry records a degraded-start
    ///   marker for that task
    pub task_timeout: Duration,

    /// Overall deadline for the splash phase.
    ///
    /// - `Duration::ZERO` = no deadline (wait for every task)
    /// - `> 0` = tasks still running at the deadline are cancelled; the
    ///   lifecycle proceeds to the running phase regardless
    pub splash_deadline: Duration,
}

impl Config {
    /// Returns the startup-task concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent tasks
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the per-task timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per task
    #[inline]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        if self.task_timeout == Duration::ZERO {
            None
        } else {
            Some(self.task_timeout)
        }
    }

    /// Returns the splash-phase deadline as an `Option`.
    ///
    /// - `None` → wait for all tasks
    /// - `Some(d)` → cancel tasks still running after `d`
    #[inline]
    pub fn phase_deadline(&self) -> Option<Duration> {
        if self.splash_deadline == Duration::ZERO {
            None
        } else {
            Some(self.splash_deadline)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_concurrent = 0` (unlimited)
    /// - `task_timeout = 0s` (no timeout)
    /// - `splash_deadline = 60s` (bounded startup)
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            task_timeout: Duration::from_secs(0),
            splash_deadline: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_zero_means_unlimited() {
        let cfg = Config {
            max_concurrent: 0,
            task_timeout: Duration::ZERO,
            splash_deadline: Duration::ZERO,
        };
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.attempt_timeout(), None);
        assert_eq!(cfg.phase_deadline(), None);
    }

    #[test]
    fn test_nonzero_values_pass_through() {
        let cfg = Config {
            max_concurrent: 4,
            task_timeout: Duration::from_secs(5),
            splash_deadline: Duration::from_secs(30),
        };
        assert_eq!(cfg.concurrency_limit(), Some(4));
        assert_eq!(cfg.attempt_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(cfg.phase_deadline(), Some(Duration::from_secs(30)));
    }
}
