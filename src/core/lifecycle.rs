//! # LifecycleController: the boot → run → restart-or-exit state machine.
//!
//! Drives the application through
//! `Initializing → SplashPhase → Running → (Restarting → Initializing) | Exiting`
//! against two injected collaborators: a [`Platform`] (native window-system
//! preconditions, teardown) and a [`Frontend`] (the interactive main loop).
//! Both are traits, so the whole machine is testable without a real
//! windowing or task subsystem.
//!
//! ## Per-iteration discipline
//! Every pass through `Initializing` builds a **fresh** [`AppContext`]:
//! fresh registries (no subscription survives a restart), a fresh restart
//! flag (false), and exactly one newly installed restart-handler
//! subscription. Restart is therefore idempotent per signal: N publications
//! of [`REQUEST_RESTART`](crate::events::wellknown::REQUEST_RESTART) within
//! one run produce exactly one teardown/re-initialization cycle.
//!
//! ## Fatal-vs-recoverable policy
//! A failing [`Platform::init_native`] is a precondition no restart can fix;
//! the controller propagates [`RuntimeError::FatalPrecondition`] immediately
//! and the process maps it to a non-zero exit status. A failing startup task
//! is recoverable: it records degraded-start markers and the machine still
//! reaches `Running`.
//!
//! ## Example
//! ```no_run
//! use appvisor::{Config, HeadlessFrontend, LifecycleController, NullPlatform};
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let controller =
//!         LifecycleController::new(Config::default(), NullPlatform, HeadlessFrontend);
//!     match controller.run().await {
//!         Ok(()) => std::process::ExitCode::SUCCESS,
//!         Err(e) => {
//!             eprintln!("{e}");
//!             std::process::ExitCode::from(e.exit_code() as u8)
//!         }
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::context::AppContext;
use crate::core::{shutdown, splash};
use crate::error::RuntimeError;
use crate::events::wellknown::REQUEST_RESTART;
use crate::tasks::TaskRef;

/// States of the application lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// One-time per-iteration setup: fresh context, native preconditions,
    /// restart handler installation.
    Initializing,
    /// Startup tasks running concurrently behind the progress view.
    SplashPhase,
    /// The frontend's interactive main loop.
    Running,
    /// Teardown on the way back to `Initializing`.
    Restarting,
    /// Normal termination.
    Exiting,
}

/// Native window-system collaborator.
///
/// `init_native` runs once per lifecycle iteration, before anything else
/// touches the windowing system; an error is a fatal precondition (the
/// lifecycle terminates, it never retries). `teardown` releases native
/// resources after the frontend returns, on both the restart and the exit
/// path.
pub trait Platform: Send + Sync {
    /// Establishes native preconditions for this iteration.
    fn init_native(&self) -> Result<(), RuntimeError>;

    /// Releases native resources after the running phase.
    fn teardown(&self) {}
}

/// No-op platform for headless operation, demos, and tests.
pub struct NullPlatform;

impl Platform for NullPlatform {
    fn init_native(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// The interactive main loop collaborator (the `Running` phase).
///
/// Runs until told to stop — by the user closing the application, an OS
/// signal, or a restart request. Returning `Err` terminates the lifecycle
/// with that error after platform teardown.
#[async_trait]
pub trait Frontend: Send + Sync {
    /// Runs the main loop against this iteration's context.
    async fn run(&self, ctx: &Arc<AppContext>) -> Result<(), RuntimeError>;
}

/// Frontend for CLI and test use: parks until an OS termination signal or a
/// restart request arrives.
pub struct HeadlessFrontend;

#[async_trait]
impl Frontend for HeadlessFrontend {
    async fn run(&self, ctx: &Arc<AppContext>) -> Result<(), RuntimeError> {
        // A restart may already be pending from a startup task.
        if ctx.restart_requested() {
            return Ok(());
        }

        let restart = Arc::new(Notify::new());
        let sub = {
            let restart = Arc::clone(&restart);
            ctx.events()
                .subscribe(REQUEST_RESTART, move |_: &()| restart.notify_one())
        };

        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {}
            _ = restart.notified() => {}
        }

        ctx.events().unsubscribe(sub);
        Ok(())
    }
}

/// Drives the lifecycle state machine over injected collaborators.
pub struct LifecycleController<P, F> {
    cfg: Config,
    platform: P,
    frontend: F,
    tasks: Vec<TaskRef>,
    state: Mutex<LifecycleState>,
    boots: AtomicU32,
}

impl<P: Platform, F: Frontend> LifecycleController<P, F> {
    /// Creates a controller with no startup tasks.
    pub fn new(cfg: Config, platform: P, frontend: F) -> Self {
        Self {
            cfg,
            platform,
            frontend,
            tasks: Vec::new(),
            state: Mutex::new(LifecycleState::Initializing),
            boots: AtomicU32::new(0),
        }
    }

    /// Sets the startup tasks executed during every splash phase.
    #[must_use]
    pub fn with_startup_tasks(mut self, tasks: Vec<TaskRef>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of completed `Initializing` entries (1 on a normal run,
    /// 1 + number of restarts otherwise).
    pub fn boot_cycles(&self) -> u32 {
        self.boots.load(Ordering::SeqCst)
    }

    /// Runs the state machine until exit or a fatal error.
    ///
    /// Every iteration: fresh context → native init → restart handler →
    /// splash → file-open drain → frontend → teardown → restart check.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        loop {
            self.enter(LifecycleState::Initializing);
            self.boots.fetch_add(1, Ordering::SeqCst);

            let ctx = AppContext::new();
            self.platform.init_native()?;
            ctx.install_restart_handler();

            self.enter(LifecycleState::SplashPhase);
            splash::run_startup_tasks(&ctx, &self.tasks, &self.cfg).await;
            ctx.drain_pending_opens();

            self.enter(LifecycleState::Running);
            let run_result = self.frontend.run(&ctx).await;

            // Native resources are released on every path out of `Running`.
            self.platform.teardown();
            run_result?;

            if ctx.restart_requested() {
                info!("restart requested; re-initializing with a fresh context");
                self.enter(LifecycleState::Restarting);
                drop(ctx);
                continue;
            }

            self.enter(LifecycleState::Exiting);
            return Ok(());
        }
    }

    fn enter(&self, state: LifecycleState) {
        debug!(?state, "lifecycle transition");
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::TaskFn;
    use std::sync::atomic::AtomicUsize;
    use tokio_util::sync::CancellationToken;

    /// Frontend that records every context it runs against and publishes a
    /// configurable number of restart requests on its first run. State is
    /// shared so the test keeps observing after the controller consumes it.
    #[derive(Clone)]
    struct ScriptedFrontend {
        runs: Arc<AtomicUsize>,
        restarts_on_first_run: usize,
        seen: Arc<Mutex<Vec<Arc<AppContext>>>>,
    }

    impl ScriptedFrontend {
        fn new(restarts_on_first_run: usize) -> Self {
            Self {
                runs: Arc::new(AtomicUsize::new(0)),
                restarts_on_first_run,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Frontend for ScriptedFrontend {
        async fn run(&self, ctx: &Arc<AppContext>) -> Result<(), RuntimeError> {
            self.seen.lock().unwrap().push(Arc::clone(ctx));
            if self.runs.fetch_add(1, Ordering::SeqCst) == 0 {
                for _ in 0..self.restarts_on_first_run {
                    ctx.request_restart();
                }
            }
            Ok(())
        }
    }

    struct FailingPlatform;
    impl Platform for FailingPlatform {
        fn init_native(&self) -> Result<(), RuntimeError> {
            Err(RuntimeError::FatalPrecondition {
                reason: "windowing subsystem unavailable".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_restart_cycles_exactly_once_per_signal() {
        let frontend = ScriptedFrontend::new(1);
        let controller =
            LifecycleController::new(Config::default(), NullPlatform, frontend.clone());

        controller.run().await.unwrap();

        assert_eq!(controller.boot_cycles(), 2);
        assert_eq!(controller.state(), LifecycleState::Exiting);
        assert_eq!(frontend.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_restart_signals_coalesce() {
        let frontend = ScriptedFrontend::new(3);
        let controller =
            LifecycleController::new(Config::default(), NullPlatform, frontend.clone());

        controller.run().await.unwrap();

        // Three signals in one running phase still mean one restart.
        assert_eq!(controller.boot_cycles(), 2);
    }

    #[tokio::test]
    async fn test_fresh_context_has_one_restart_subscription() {
        let frontend = ScriptedFrontend::new(1);
        let controller =
            LifecycleController::new(Config::default(), NullPlatform, frontend.clone());
        controller.run().await.unwrap();

        let seen = frontend.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        // Contexts are distinct, and each iteration installed exactly one
        // restart handler (never two, even after re-entering Initializing).
        assert!(!Arc::ptr_eq(&seen[0], &seen[1]));
        for ctx in seen.iter() {
            assert_eq!(ctx.events().subscriber_count(REQUEST_RESTART), 1);
        }
        // The first iteration's flag was consumed; the second stayed clean.
        assert!(seen[0].restart_requested());
        assert!(!seen[1].restart_requested());
    }

    #[tokio::test]
    async fn test_fatal_precondition_terminates_without_running() {
        let frontend = ScriptedFrontend::new(0);
        let controller =
            LifecycleController::new(Config::default(), FailingPlatform, frontend.clone());

        let err = controller.run().await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_fatal_precondition");
        assert_ne!(err.exit_code(), 0);
        assert!(frontend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_degraded_splash_still_reaches_running() {
        let frontend = ScriptedFrontend::new(0);
        let tasks: Vec<TaskRef> = vec![
            TaskFn::arc("ok-one", |_ctx: Arc<AppContext>, _cancel: CancellationToken| async { Ok(()) }),
            TaskFn::arc("broken", |_ctx: Arc<AppContext>, _cancel: CancellationToken| async {
                Err(TaskError::Fail {
                    error: "missing plugin".into(),
                })
            }),
            TaskFn::arc("ok-two", |_ctx: Arc<AppContext>, _cancel: CancellationToken| async { Ok(()) }),
        ];
        let controller =
            LifecycleController::new(Config::default(), NullPlatform, frontend.clone())
                .with_startup_tasks(tasks);

        controller.run().await.unwrap();

        let seen = frontend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "frontend ran despite the failing task");
        assert!(seen[0].has_init_marker("tasks-failed"));
        assert!(seen[0].has_init_marker("task-failed:broken"));
        assert_eq!(controller.state(), LifecycleState::Exiting);
    }

    #[tokio::test]
    async fn test_headless_frontend_returns_on_pending_restart() {
        let ctx = AppContext::new();
        ctx.install_restart_handler();
        ctx.request_restart();

        // Restart was requested before the frontend subscribed; it must not park.
        HeadlessFrontend.run(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_queued_file_opens_survive_until_running() {
        let frontend = ScriptedFrontend::new(0);
        // A startup task queues a file-open and subscribes the handler that
        // the running phase will need; the drain happens after the splash.
        let opened = Arc::new(Mutex::new(Vec::new()));
        let task: TaskRef = {
            let opened = Arc::clone(&opened);
            TaskFn::arc("request-open", move |ctx: Arc<AppContext>, _cancel: CancellationToken| {
                let opened = Arc::clone(&opened);
                async move {
                    ctx.queue_file_open("/tmp/drop.bin".into());
                    let opened = Arc::clone(&opened);
                    ctx.events().subscribe(
                        crate::events::wellknown::REQUEST_OPEN_FILE,
                        move |p: &std::path::PathBuf| {
                            opened.lock().unwrap().push(p.clone());
                        },
                    );
                    Ok(())
                }
            })
        };

        let controller =
            LifecycleController::new(Config::default(), NullPlatform, frontend.clone())
                .with_startup_tasks(vec![task]);
        controller.run().await.unwrap();

        assert_eq!(
            *opened.lock().unwrap(),
            vec![std::path::PathBuf::from("/tmp/drop.bin")]
        );
    }
}
