//! # EventRegistry: ordered, typed publish/subscribe dispatch.
//!
//! Holds, per event kind, an ordered list of subscriber callbacks and
//! provides define/subscribe/unsubscribe/publish.
//!
//! ## Rules
//! - **Registration order**: subscribers are invoked in the order they were
//!   added, every live subscriber exactly once per publication.
//! - **Removal during dispatch**: the subscriber list is snapshotted at
//!   publish time, then each callback's liveness is re-checked right before
//!   invocation. A subscriber removed mid-dispatch (even by an earlier
//!   subscriber of the same publication) is skipped, never invoked dangling.
//! - **Reentrancy**: no registry lock is held while a callback runs, so a
//!   callback may subscribe, unsubscribe, publish, and issue requests —
//!   including on the kind currently being dispatched.
//! - **Per-kind independence**: kinds live in a sharded map with a per-kind
//!   list lock; publishing one kind never blocks subscription changes on
//!   another.
//! - **Fail fast**: publishing a kind that was never defined is a programmer
//!   error and panics with a loud diagnostic. Silently dropping events (e.g.
//!   a provider-creation request) would corrupt application state invisibly.
//!
//! ## Example
//! ```rust
//! use appvisor::events::{EventKind, EventRegistry};
//!
//! const GREETED: EventKind<String> = EventKind::new("demo.greeted");
//!
//! let registry = EventRegistry::new();
//! let id = registry.subscribe(GREETED, |who: &String| {
//!     let _ = who;
//! });
//! registry.publish(GREETED, &"world".to_string());
//! registry.unsubscribe(id);
//! registry.unsubscribe(id); // no-op
//! ```

use std::any::{Any, TypeId, type_name};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::trace;

use super::kind::{EventKind, SubscriptionId};

/// Boxed subscriber callback for a kind with parameter type `A`.
type Callback<A> = Box<dyn Fn(&A) + Send + Sync>;

struct SubEntry {
    serial: u64,
    callback: Arc<dyn Any + Send + Sync>,
}

struct SubscriberList {
    next_serial: u64,
    entries: Vec<SubEntry>,
}

pub(crate) struct KindEntry {
    name: &'static str,
    params: TypeId,
    params_name: &'static str,
    subs: Mutex<SubscriberList>,
}

impl KindEntry {
    fn new<A: 'static>(name: &'static str) -> Self {
        Self {
            name,
            params: TypeId::of::<A>(),
            params_name: type_name::<A>(),
            subs: Mutex::new(SubscriberList {
                next_serial: 0,
                entries: Vec::new(),
            }),
        }
    }

    fn check_signature<A: 'static>(&self) {
        if self.params != TypeId::of::<A>() {
            panic!(
                "event kind `{}` redefined with conflicting signature: registered as {}, used as {}",
                self.name,
                self.params_name,
                type_name::<A>(),
            );
        }
    }

    fn is_live(&self, serial: u64) -> bool {
        self.subs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .iter()
            .any(|s| s.serial == serial)
    }
}

/// Ordered, typed publish/subscribe registry.
///
/// Context-scoped: the [`AppContext`](crate::AppContext) creates a fresh
/// registry per lifecycle iteration so no subscription survives a restart.
/// All methods take `&self` and are safe to call from any thread.
pub struct EventRegistry {
    kinds: DashMap<&'static str, Arc<KindEntry>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: DashMap::new(),
        }
    }

    /// Registers an event kind. Idempotent: re-defining the same kind keeps
    /// the existing subscriber list.
    ///
    /// # Panics
    /// If a kind with the same name was already defined with a different
    /// parameter signature.
    pub fn define<A: 'static>(&self, kind: EventKind<A>) {
        let entry = self
            .kinds
            .entry(kind.name())
            .or_insert_with(|| Arc::new(KindEntry::new::<A>(kind.name())))
            .clone();
        entry.check_signature::<A>();
    }

    /// Appends `callback` to the kind's subscriber list and returns an id
    /// usable for removal. Future publications of the kind include this
    /// callback, in registration order.
    ///
    /// Subscribing auto-defines the kind; the undefined-kind failure mode
    /// belongs to [`publish`](Self::publish) alone.
    pub fn subscribe<A, F>(&self, kind: EventKind<A>, callback: F) -> SubscriptionId
    where
        A: 'static,
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.define(kind);
        let entry = self.entry(kind.name());

        let boxed: Arc<dyn Any + Send + Sync> = Arc::new(Box::new(callback) as Callback<A>);
        let mut subs = entry.subs.lock().unwrap_or_else(|e| e.into_inner());
        let serial = subs.next_serial;
        subs.next_serial += 1;
        subs.entries.push(SubEntry {
            serial,
            callback: boxed,
        });

        trace!(kind = kind.name(), serial, "subscriber added");
        SubscriptionId {
            kind: kind.name(),
            serial,
        }
    }

    /// Removes the subscription. Safe to call multiple times or with an id
    /// that was never issued: unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let Some(entry) = self.kinds.get(id.kind).map(|e| Arc::clone(&e)) else {
            return;
        };
        let mut subs = entry.subs.lock().unwrap_or_else(|e| e.into_inner());
        subs.entries.retain(|s| s.serial != id.serial);
    }

    /// Invokes every current subscriber for the kind, in registration order.
    ///
    /// The list is snapshotted up front; a subscriber that is unsubscribed
    /// before being reached (by an earlier subscriber or another thread) is
    /// skipped. Callbacks run without any registry lock held.
    ///
    /// # Panics
    /// If the kind was never defined. Publishing into the void is a
    /// programmer error, not a silent no-op.
    pub fn publish<A: 'static>(&self, kind: EventKind<A>, args: &A) {
        let entry = self.expect_entry(kind.name());
        entry.check_signature::<A>();

        let snapshot: Vec<(u64, Arc<dyn Any + Send + Sync>)> = {
            let subs = entry.subs.lock().unwrap_or_else(|e| e.into_inner());
            subs.entries
                .iter()
                .map(|s| (s.serial, Arc::clone(&s.callback)))
                .collect()
        };

        trace!(kind = kind.name(), subscribers = snapshot.len(), "publishing");
        for (serial, callback) in snapshot {
            if !entry.is_live(serial) {
                continue;
            }
            if let Some(cb) = callback.downcast_ref::<Callback<A>>() {
                cb(args);
            }
        }
    }

    /// Number of live subscriptions for the kind (0 if never defined).
    pub fn subscriber_count<A: 'static>(&self, kind: EventKind<A>) -> usize {
        self.kinds
            .get(kind.name())
            .map(|e| {
                e.subs
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .entries
                    .len()
            })
            .unwrap_or(0)
    }

    /// True if the kind has been defined on this registry.
    pub fn is_defined(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    fn entry(&self, name: &'static str) -> Arc<KindEntry> {
        // subscribe() defines first, so the entry always exists here.
        self.expect_entry(name)
    }

    fn expect_entry(&self, name: &str) -> Arc<KindEntry> {
        match self.kinds.get(name) {
            Some(e) => Arc::clone(&e),
            None => panic!(
                "event kind `{name}` used before being defined; \
                 define it (or subscribe to it) during initialization"
            ),
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
