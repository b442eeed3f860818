//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints the well-known events to stdout in a human-readable
//! format. This is primarily useful for development, debugging, and the demo
//! programs.
//!
//! ## Output format
//! ```text
//! [task-starting] task=load-settings
//! [task-failed] task=load-settings err=task_failed
//! [provider-created] handle=provider#1
//! [move-provider-data] from=provider#1 to=provider#2
//! [provider-destroyed] handle=provider#1
//! [restart-requested]
//! [open-file] path=/tmp/drop.bin
//! ```

use crate::core::AppContext;
use crate::events::SubscriptionId;
use crate::events::wellknown::{
    MOVE_PER_PROVIDER_DATA, PROVIDER_CREATED, PROVIDER_DESTROYED, REQUEST_OPEN_FILE,
    REQUEST_RESTART, STARTUP_TASK_FINISHED, STARTUP_TASK_STARTED,
};

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable descriptions of
/// the well-known events for debugging and demonstration purposes.
///
/// Not intended for production use - subscribe your own handlers (or wire a
/// `tracing` layer) for structured logging or metrics collection.
pub struct LogWriter;

impl LogWriter {
    /// Subscribes the writer to every well-known kind on the context.
    ///
    /// Returns the subscription ids; drop them or pass them to
    /// [`EventRegistry::unsubscribe`](crate::EventRegistry::unsubscribe) to
    /// silence the writer again. A fresh context after a restart needs a
    /// fresh `attach`.
    pub fn attach(ctx: &AppContext) -> Vec<SubscriptionId> {
        let events = ctx.events();
        vec![
            events.subscribe(STARTUP_TASK_STARTED, |name: &String| {
                println!("[task-starting] task={name}");
            }),
            events.subscribe(STARTUP_TASK_FINISHED, |outcome| {
                if outcome.ok {
                    println!("[task-stopped] task={}", outcome.name);
                } else {
                    println!(
                        "[task-failed] task={} err={}",
                        outcome.name,
                        outcome.label.unwrap_or("unknown")
                    );
                }
            }),
            events.subscribe(PROVIDER_CREATED, |handle| {
                println!("[provider-created] handle={handle}");
            }),
            events.subscribe(PROVIDER_DESTROYED, |handle| {
                println!("[provider-destroyed] handle={handle}");
            }),
            events.subscribe(MOVE_PER_PROVIDER_DATA, |mv| {
                println!("[move-provider-data] from={} to={}", mv.from, mv.to);
            }),
            events.subscribe(REQUEST_RESTART, |_: &()| {
                println!("[restart-requested]");
            }),
            events.subscribe(REQUEST_OPEN_FILE, |path: &std::path::PathBuf| {
                println!("[open-file] path={}", path.display());
            }),
        ]
    }
}
