//! # Built-in event and request kinds.
//!
//! The kinds every appvisor application shares: provider lifecycle requests,
//! the restart signal, the file-open request, and splash-phase progress.
//! Plugins declare additional kinds the same way — a `const` token plus a
//! payload type — in their own modules.
//!
//! All kinds listed here are pre-defined by
//! [`AppContext::new`](crate::AppContext::new), so publishing them can never
//! hit the undefined-kind panic.

use std::path::PathBuf;

use super::kind::{EventKind, RequestKind};
use crate::providers::ProviderHandle;

/// Parameters of [`REQUEST_CREATE_PROVIDER`].
#[derive(Clone, Debug)]
pub struct CreateProvider {
    /// Unlocalized name of the provider factory.
    pub name: String,
    /// When true, the factory must not trigger any interactive configuration
    /// step (headless/CLI provider creation).
    pub skip_load_interface: bool,
    /// Suppresses failure logging, for expected-failure probing (e.g. trying
    /// several factories in turn).
    pub no_error_log: bool,
}

impl CreateProvider {
    /// Creation request with interactive configuration and failure logging.
    pub fn interactive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skip_load_interface: false,
            no_error_log: false,
        }
    }

    /// Creation request for headless use: no interactive configuration.
    pub fn headless(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skip_load_interface: true,
            no_error_log: false,
        }
    }

    /// Suppresses failure logging for this request.
    pub fn quiet(mut self) -> Self {
        self.no_error_log = true;
        self
    }
}

/// Parameters of [`MOVE_PER_PROVIDER_DATA`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveProviderData {
    /// Provider whose per-provider data is relocated. Must be destroyed
    /// immediately after the move completes.
    pub from: ProviderHandle,
    /// Freshly created provider receiving the data.
    pub to: ProviderHandle,
}

/// Outcome of one startup task, published as splash-phase progress.
#[derive(Clone, Debug)]
pub struct StartupTaskOutcome {
    /// Task name.
    pub name: String,
    /// True if the task completed successfully.
    pub ok: bool,
    /// Failure label (`task_failed`, `task_timeout`, `task_canceled`) when
    /// `ok` is false.
    pub label: Option<&'static str>,
}

/// Creates a provider from its unlocalized factory name and registers it.
///
/// Answered by the sole handler owned by
/// [`ProviderRegistry`](crate::ProviderRegistry); the result is the new
/// provider's handle, valid until explicitly destroyed.
pub const REQUEST_CREATE_PROVIDER: RequestKind<CreateProvider, ProviderHandle> =
    RequestKind::new("appvisor.provider.request_create");

/// Moves the data of every per-provider store from one provider to another.
///
/// The `from` provider holds no per-provider data afterwards and must be
/// destroyed immediately by the caller.
pub const MOVE_PER_PROVIDER_DATA: EventKind<MoveProviderData> =
    EventKind::new("appvisor.provider.move_per_provider_data");

/// A provider was created and registered; payload is its handle.
pub const PROVIDER_CREATED: EventKind<ProviderHandle> =
    EventKind::new("appvisor.provider.created");

/// A provider is about to be destroyed. Published while the handle still
/// resolves; handles must not be cached beyond this event.
pub const PROVIDER_DESTROYED: EventKind<ProviderHandle> =
    EventKind::new("appvisor.provider.destroyed");

/// Requests a full application restart: teardown, then re-initialization.
/// No parameters, no result; duplicate signals within one run coalesce.
pub const REQUEST_RESTART: EventKind<()> = EventKind::new("appvisor.lifecycle.request_restart");

/// Asks whichever subsystem owns file handling to open the given path.
/// Publications queued before the running phase are drained after the splash
/// phase completes.
pub const REQUEST_OPEN_FILE: EventKind<PathBuf> = EventKind::new("appvisor.lifecycle.open_file");

/// A startup task began executing; payload is the task name.
pub const STARTUP_TASK_STARTED: EventKind<String> =
    EventKind::new("appvisor.lifecycle.startup_task_started");

/// A startup task finished; payload reports success or the failure label.
pub const STARTUP_TASK_FINISHED: EventKind<StartupTaskOutcome> =
    EventKind::new("appvisor.lifecycle.startup_task_finished");
