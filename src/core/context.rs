//! # AppContext: the process-scoped dispatch context.
//!
//! One `AppContext` spans one lifecycle iteration, from `Initializing` to
//! teardown. It owns the event registry, the request channel, the provider
//! registry, and the data migrator, and is passed explicitly (by `Arc`) to
//! every component that publishes or subscribes — there is no global bus.
//! A restart creates a fresh context, which is what guarantees that no stale
//! subscription survives into the next iteration.
//!
//! ## Wiring
//! Construction pre-defines every well-known kind and installs the two
//! subscriptions the provider protocol needs:
//! - the sole [`REQUEST_CREATE_PROVIDER`] handler, backed by
//!   [`ProviderRegistry`];
//! - the [`MOVE_PER_PROVIDER_DATA`] subscriber, which validates both handles
//!   and delegates to the [`ProviderDataMigrator`].
//!
//! Both closures hold the context **weakly**: a subscription stored inside
//! the registry that strongly captured the context owning that registry
//! would form a reference cycle and leak the whole context.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::error::{CreateError, MigrateError};
use crate::events::wellknown::{
    CreateProvider, MOVE_PER_PROVIDER_DATA, PROVIDER_CREATED, PROVIDER_DESTROYED,
    REQUEST_CREATE_PROVIDER, REQUEST_OPEN_FILE, REQUEST_RESTART, STARTUP_TASK_FINISHED,
    STARTUP_TASK_STARTED,
};
use crate::events::{EventRegistry, RequestChannel};
use crate::providers::{ProviderDataMigrator, ProviderHandle, ProviderRegistry};

/// Process-scoped context tying the bus, the providers, and the restart flag
/// together for one lifecycle iteration.
pub struct AppContext {
    events: EventRegistry,
    requests: RequestChannel,
    providers: Arc<ProviderRegistry>,
    migrator: Arc<ProviderDataMigrator>,
    restart: AtomicBool,
    init_markers: Mutex<BTreeSet<String>>,
    pending_opens: Mutex<Vec<PathBuf>>,
}

impl AppContext {
    /// Creates a fresh, fully wired context.
    pub fn new() -> Arc<Self> {
        let ctx = Arc::new(Self {
            events: EventRegistry::new(),
            requests: RequestChannel::new(),
            providers: Arc::new(ProviderRegistry::new()),
            migrator: Arc::new(ProviderDataMigrator::new()),
            restart: AtomicBool::new(false),
            init_markers: Mutex::new(BTreeSet::new()),
            pending_opens: Mutex::new(Vec::new()),
        });
        ctx.define_wellknown();
        ctx.install_provider_protocol();
        ctx
    }

    /// The event registry of this iteration.
    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// The request channel of this iteration.
    pub fn requests(&self) -> &RequestChannel {
        &self.requests
    }

    /// The provider registry of this iteration.
    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    /// The per-provider data migrator of this iteration.
    pub fn migrator(&self) -> &Arc<ProviderDataMigrator> {
        &self.migrator
    }

    // ---------------------------
    // Provider protocol
    // ---------------------------

    /// Creates a provider and publishes [`PROVIDER_CREATED`] on success.
    ///
    /// This is the implementation behind the [`REQUEST_CREATE_PROVIDER`]
    /// handler; calling it directly is equivalent to issuing the request,
    /// minus the suppressible failure logging.
    pub fn create_provider(&self, req: &CreateProvider) -> Result<ProviderHandle, CreateError> {
        let handle = self.providers.create(&req.name, req.skip_load_interface)?;
        self.events.publish(PROVIDER_CREATED, &handle);
        Ok(handle)
    }

    /// Destroys a provider: publishes [`PROVIDER_DESTROYED`] while the handle
    /// still resolves, removes it from the live set, runs the provider's
    /// teardown hook, and discards any leftover per-provider data.
    ///
    /// Returns `false` for a handle that is not (or no longer) live.
    pub fn destroy_provider(&self, handle: ProviderHandle) -> bool {
        if !self.providers.contains(handle) {
            return false;
        }
        self.events.publish(PROVIDER_DESTROYED, &handle);
        let Some(provider) = self.providers.take(handle) else {
            return false;
        };
        provider.close();
        self.migrator.discard(handle);
        debug!(%handle, "provider destroyed");
        true
    }

    /// Relocates all per-provider data from `from` to `to`.
    ///
    /// Validates that both handles are live and distinct; `from` must be
    /// destroyed by the caller immediately after this returns.
    pub fn move_provider_data(
        &self,
        from: ProviderHandle,
        to: ProviderHandle,
    ) -> Result<(), MigrateError> {
        if from == to {
            return Err(MigrateError::SameProvider(from.raw()));
        }
        if !self.providers.contains(from) {
            return Err(MigrateError::UnknownSource(from.raw()));
        }
        if !self.providers.contains(to) {
            return Err(MigrateError::UnknownTarget(to.raw()));
        }
        self.migrator.migrate(from, to);
        Ok(())
    }

    // ---------------------------
    // Lifecycle surface
    // ---------------------------

    /// Publishes the restart request. Equivalent to publishing
    /// [`REQUEST_RESTART`] yourself; duplicate signals within one iteration
    /// coalesce into a single restart.
    pub fn request_restart(&self) {
        self.events.publish(REQUEST_RESTART, &());
    }

    /// True once a restart has been requested in this iteration.
    pub fn restart_requested(&self) -> bool {
        self.restart.load(Ordering::SeqCst)
    }

    /// Records a degraded-start diagnostic marker. Markers are a set: the
    /// union of all recorded markers, duplicates collapse.
    pub fn add_init_marker(&self, marker: impl Into<String>) {
        self.init_markers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(marker.into());
    }

    /// True if the marker has been recorded.
    pub fn has_init_marker(&self, marker: &str) -> bool {
        self.init_markers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(marker)
    }

    /// All recorded markers, sorted.
    pub fn init_markers(&self) -> Vec<String> {
        self.init_markers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Queues a file-open request for delivery once the splash phase has
    /// completed (before that, nothing is subscribed to handle it).
    pub fn queue_file_open(&self, path: PathBuf) {
        self.pending_opens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path);
    }

    /// Publishes [`REQUEST_OPEN_FILE`] for every queued path, in queue order.
    pub fn drain_pending_opens(&self) {
        let pending: Vec<PathBuf> = {
            let mut opens = self.pending_opens.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *opens)
        };
        for path in pending {
            info!(path = %path.display(), "delivering queued file-open request");
            self.events.publish(REQUEST_OPEN_FILE, &path);
        }
    }

    /// Installs the restart handler for this iteration. Called once per
    /// iteration by the lifecycle controller, on a fresh context, so exactly
    /// one restart subscription is ever live.
    pub(crate) fn install_restart_handler(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.events.subscribe(REQUEST_RESTART, move |_: &()| {
            if let Some(ctx) = weak.upgrade() {
                ctx.restart.store(true, Ordering::SeqCst);
            }
        });
    }

    fn define_wellknown(&self) {
        self.requests.define(REQUEST_CREATE_PROVIDER);
        self.events.define(MOVE_PER_PROVIDER_DATA);
        self.events.define(PROVIDER_CREATED);
        self.events.define(PROVIDER_DESTROYED);
        self.events.define(REQUEST_RESTART);
        self.events.define(REQUEST_OPEN_FILE);
        self.events.define(STARTUP_TASK_STARTED);
        self.events.define(STARTUP_TASK_FINISHED);
    }

    /// Installs the creation-request handler and the move-data subscriber.
    ///
    /// The closures hold `Weak<AppContext>`; see the module docs for why.
    fn install_provider_protocol(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let installed = self.requests.handle(REQUEST_CREATE_PROVIDER, move |req| {
            let ctx = weak.upgrade()?;
            Self::answer_create_request(&ctx, req)
        });
        debug_assert!(
            installed.is_ok(),
            "fresh context: the create-provider handler is installed exactly once"
        );

        let weak = Arc::downgrade(self);
        self.events.subscribe(MOVE_PER_PROVIDER_DATA, move |mv| {
            let Some(ctx) = weak.upgrade() else {
                return;
            };
            if let Err(e) = ctx.move_provider_data(mv.from, mv.to) {
                error!(from = %mv.from, to = %mv.to, label = e.as_label(), "{e}");
            }
        });
    }

    fn answer_create_request(ctx: &Arc<Self>, req: &CreateProvider) -> Option<ProviderHandle> {
        match ctx.create_provider(req) {
            Ok(handle) => Some(handle),
            Err(e) => {
                if !req.no_error_log {
                    warn!(factory = %req.name, label = e.as_label(), "{e}");
                }
                None
            }
        }
    }
}
