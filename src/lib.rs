//! # appvisor
//!
//! **Appvisor** is the event/request dispatch core and lifecycle controller
//! for extensible desktop tools.
//!
//! Plugins and internal subsystems never call one another directly: they
//! communicate exclusively through a typed publish/subscribe bus, including
//! "request" events that return a value to the caller. On top of the bus
//! sits a provider lifecycle protocol (creation requests, per-provider data
//! migration) and a restart-capable application lifecycle
//! (boot → run → optional full teardown-and-reboot → exit).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Plugin    │   │   Menu/CLI   │   │  Subsystem   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  AppContext (one per lifecycle iteration)                         │
//! │  - EventRegistry   (ordered pub/sub, per-kind locking)            │
//! │  - RequestChannel  (request/response, exactly one handler)        │
//! │  - ProviderRegistry (factories by name, owns live providers)      │
//! │  - ProviderDataMigrator (relocates per-provider stores)           │
//! │  - restart flag, init markers, pending file-open queue            │
//! └──────────────┬──────────────────────────────┬─────────────────────┘
//!                │ owns the sole handler        │ subscribes
//!                ▼                              ▼
//!      REQUEST_CREATE_PROVIDER          MOVE_PER_PROVIDER_DATA
//! ```
//!
//! ### Lifecycle
//! ```text
//! LifecycleController::run()
//!
//! loop {
//!   ├─► Initializing: fresh AppContext, Platform::init_native()?,
//!   │                 install restart handler (exactly one)
//!   ├─► SplashPhase:  startup tasks on a JoinSet (semaphore cap, timeouts);
//!   │                 failures → degraded-start markers, phase completes;
//!   │                 drain queued file-open requests
//!   ├─► Running:      Frontend::run(ctx) until stop/restart/signal
//!   ├─► Platform::teardown()
//!   └─► restart requested?
//!         ├─ yes → Restarting → continue (context dropped, nothing leaks)
//!         └─ no  → Exiting → return Ok(())
//! }
//! ```
//!
//! ## Features
//! | Area            | Description                                                   | Key types / traits                         |
//! |-----------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Event bus**   | Typed kinds, ordered dispatch, request/response.              | [`EventKind`], [`EventRegistry`], [`RequestChannel`] |
//! | **Providers**   | Named factories, opaque handles, per-provider data migration. | [`ProviderFactory`], [`ProviderRegistry`], [`PerProviderData`] |
//! | **Lifecycle**   | Restart-capable state machine over injected collaborators.    | [`LifecycleController`], [`Platform`], [`Frontend`] |
//! | **Tasks**       | Async cancelable startup units for the splash phase.          | [`StartupTask`], [`TaskFn`], [`TaskRef`]   |
//! | **Errors**      | Typed errors per failure channel, `as_label()` helpers.       | [`RuntimeError`], [`CreateError`], [`TaskError`] |
//! | **Config**      | Centralized splash-phase settings.                            | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use appvisor::{
//!     AppContext, Config, Frontend, LifecycleController, NullPlatform, RuntimeError,
//!     TaskFn, TaskRef,
//!     events::wellknown::{CreateProvider, REQUEST_CREATE_PROVIDER},
//! };
//! use async_trait::async_trait;
//!
//! /// Frontend that creates a provider through the bus, then exits.
//! struct OneShot;
//!
//! #[async_trait]
//! impl Frontend for OneShot {
//!     async fn run(&self, ctx: &Arc<AppContext>) -> Result<(), RuntimeError> {
//!         let handle = ctx
//!             .requests()
//!             .request(REQUEST_CREATE_PROVIDER, &CreateProvider::headless("mem").quiet());
//!         // `None` here: no "mem" factory was registered.
//!         assert!(handle.is_none());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warmup: TaskRef = TaskFn::arc("warmup", |_ctx: Arc<AppContext>, _cancel: tokio_util::sync::CancellationToken| async {
//!         Ok(())
//!     });
//!
//!     let controller = LifecycleController::new(Config::default(), NullPlatform, OneShot)
//!         .with_startup_tasks(vec![warmup]);
//!     controller.run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
pub mod events;
pub mod providers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{BusError, CreateError, MigrateError, RuntimeError, TaskError};
pub use events::{
    EventKind, EventRegistry, RequestChannel, RequestHandlerId, RequestKind, SubscriptionId,
};
pub use self::core::{
    AppContext, Frontend, HeadlessFrontend, LifecycleController, LifecycleState, NullPlatform,
    Platform, wait_for_shutdown_signal,
};
pub use providers::{
    PerProviderData, Provider, ProviderDataMigrator, ProviderFactory, ProviderHandle,
    ProviderRef, ProviderRegistry,
};
pub use tasks::{StartupTask, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
