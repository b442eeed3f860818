//! # Splash phase: concurrent startup-task execution.
//!
//! Runs the bounded set of startup tasks on the task pool while the host's
//! progress view (a collaborator, not part of this crate) renders the
//! [`STARTUP_TASK_STARTED`] / [`STARTUP_TASK_FINISHED`] events.
//!
//! ## Rules
//! - Tasks run concurrently, capped by [`Config::max_concurrent`]
//!   (`0` = unlimited) and individually bounded by [`Config::task_timeout`].
//! - A failing task records degraded-start markers (`tasks-failed` plus
//!   `task-failed:<name>`) and the phase **still completes** — the user gets
//!   actionable diagnostics instead of a silent exit.
//! - If [`Config::splash_deadline`] expires, remaining tasks are cancelled
//!   cooperatively, a `splash-deadline-exceeded` marker is recorded, and the
//!   lifecycle proceeds.
//! - A panicking task is contained: it is reported like a failure and the
//!   phase keeps draining.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::context::AppContext;
use crate::error::TaskError;
use crate::events::wellknown::{STARTUP_TASK_FINISHED, STARTUP_TASK_STARTED, StartupTaskOutcome};
use crate::tasks::TaskRef;

/// Runs all startup tasks to completion (or to the phase deadline).
pub(crate) async fn run_startup_tasks(ctx: &Arc<AppContext>, tasks: &[TaskRef], cfg: &Config) {
    if tasks.is_empty() {
        return;
    }

    let semaphore = cfg
        .concurrency_limit()
        .map(|n| Arc::new(Semaphore::new(n)));
    let cancel = CancellationToken::new();

    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(run_one(
            Arc::clone(ctx),
            Arc::clone(task),
            cfg.attempt_timeout(),
            semaphore.clone(),
            cancel.child_token(),
        ));
    }

    match cfg.phase_deadline() {
        Some(deadline) => {
            if time::timeout(deadline, drain(ctx, &mut set)).await.is_err() {
                warn!(?deadline, "splash deadline exceeded; cancelling remaining tasks");
                ctx.add_init_marker("splash-deadline-exceeded");
                cancel.cancel();
                drain(ctx, &mut set).await;
            }
        }
        None => drain(ctx, &mut set).await,
    }
}

/// Joins every spawned task, reporting panics as failures.
async fn drain(ctx: &Arc<AppContext>, set: &mut JoinSet<()>) {
    while let Some(joined) = set.join_next().await {
        if let Err(join_err) = joined {
            warn!("startup task panicked: {join_err}");
            ctx.add_init_marker("tasks-failed");
        }
    }
}

/// Executes one startup task: permit → started event → run (with optional
/// timeout) → finished event → degraded-start bookkeeping.
async fn run_one(
    ctx: Arc<AppContext>,
    task: TaskRef,
    timeout: Option<Duration>,
    semaphore: Option<Arc<Semaphore>>,
    cancel: CancellationToken,
) {
    let name = task.name().to_string();

    let _permit = match &semaphore {
        Some(sem) => {
            tokio::select! {
                res = sem.clone().acquire_owned() => match res {
                    Ok(permit) => Some(permit),
                    Err(_closed) => {
                        report(&ctx, &name, &Err(TaskError::Canceled));
                        return;
                    }
                },
                _ = cancel.cancelled() => {
                    report(&ctx, &name, &Err(TaskError::Canceled));
                    return;
                }
            }
        }
        None => None,
    };

    ctx.events().publish(STARTUP_TASK_STARTED, &name);

    let res = match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, task.run(Arc::clone(&ctx), cancel.clone())).await {
            Ok(r) => r,
            Err(_elapsed) => Err(TaskError::Timeout { timeout: dur }),
        },
        None => task.run(Arc::clone(&ctx), cancel.clone()).await,
    };

    report(&ctx, &name, &res);
}

/// Publishes the finished event and records degraded-start markers.
fn report(ctx: &Arc<AppContext>, name: &str, res: &Result<(), TaskError>) {
    let outcome = match res {
        Ok(()) => {
            debug!(task = name, "startup task finished");
            StartupTaskOutcome {
                name: name.to_string(),
                ok: true,
                label: None,
            }
        }
        Err(e) => {
            warn!(task = name, label = e.as_label(), "startup task did not finish: {}", e.as_message());
            if e.is_degrading() {
                ctx.add_init_marker("tasks-failed");
                ctx.add_init_marker(format!("task-failed:{name}"));
            }
            StartupTaskOutcome {
                name: name.to_string(),
                ok: false,
                label: Some(e.as_label()),
            }
        }
    };
    ctx.events().publish(STARTUP_TASK_FINISHED, &outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok_task(name: &'static str) -> TaskRef {
        TaskFn::arc(name, |_ctx: Arc<AppContext>, _cancel: CancellationToken| async { Ok(()) })
    }

    fn failing_task(name: &'static str) -> TaskRef {
        TaskFn::arc(name, |_ctx: Arc<AppContext>, _cancel: CancellationToken| async {
            Err(TaskError::Fail {
                error: "boom".into(),
            })
        })
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_phase() {
        let ctx = AppContext::new();
        let finished = Arc::new(Mutex::new(Vec::new()));
        {
            let finished = Arc::clone(&finished);
            ctx.events()
                .subscribe(STARTUP_TASK_FINISHED, move |o: &StartupTaskOutcome| {
                    finished.lock().unwrap().push((o.name.clone(), o.ok));
                });
        }

        let tasks = vec![ok_task("first"), failing_task("settings"), ok_task("third")];
        run_startup_tasks(&ctx, &tasks, &Config::default()).await;

        let finished = finished.lock().unwrap();
        assert_eq!(finished.len(), 3);
        assert_eq!(finished.iter().filter(|(_, ok)| *ok).count(), 2);
        assert!(ctx.has_init_marker("tasks-failed"));
        assert!(ctx.has_init_marker("task-failed:settings"));
    }

    #[tokio::test]
    async fn test_all_ok_leaves_no_markers() {
        let ctx = AppContext::new();
        let tasks = vec![ok_task("a"), ok_task("b")];
        run_startup_tasks(&ctx, &tasks, &Config::default()).await;
        assert!(ctx.init_markers().is_empty());
    }

    #[tokio::test]
    async fn test_task_timeout_marks_degraded() {
        let ctx = AppContext::new();
        let slow: TaskRef = TaskFn::arc("slow", |_ctx: Arc<AppContext>, _cancel: CancellationToken| async {
            time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });

        let cfg = Config {
            task_timeout: Duration::from_millis(20),
            ..Config::default()
        };
        run_startup_tasks(&ctx, &[slow], &cfg).await;

        assert!(ctx.has_init_marker("tasks-failed"));
        assert!(ctx.has_init_marker("task-failed:slow"));
    }

    #[tokio::test]
    async fn test_phase_deadline_cancels_stragglers() {
        let ctx = AppContext::new();
        let straggler: TaskRef = TaskFn::arc("straggler", |_ctx: Arc<AppContext>, cancel: CancellationToken| async move {
            cancel.cancelled().await;
            Err(TaskError::Canceled)
        });

        let cfg = Config {
            splash_deadline: Duration::from_millis(50),
            ..Config::default()
        };
        run_startup_tasks(&ctx, &[straggler, ok_task("quick")], &cfg).await;

        assert!(ctx.has_init_marker("splash-deadline-exceeded"));
        // Cancellation is a graceful stop, not a task failure.
        assert!(!ctx.has_init_marker("task-failed:straggler"));
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let ctx = AppContext::new();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks: Vec<TaskRef> = Vec::new();
        for i in 0..6 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            tasks.push(Arc::new(TaskFn::new(
                format!("task-{i}"),
                move |_ctx: Arc<AppContext>, _cancel: CancellationToken| {
                    let running = Arc::clone(&running);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        time::sleep(Duration::from_millis(10)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            )));
        }

        let cfg = Config {
            max_concurrent: 2,
            ..Config::default()
        };
        run_startup_tasks(&ctx, &tasks, &cfg).await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let ctx = AppContext::new();
        let panicking: TaskRef =
            TaskFn::arc("panicking", |_ctx: Arc<AppContext>, _cancel: CancellationToken| async {
                panic!("task panic")
            });

        run_startup_tasks(&ctx, &[panicking, ok_task("steady")], &Config::default()).await;
        assert!(ctx.has_init_marker("tasks-failed"));
    }
}
