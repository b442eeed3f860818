//! # Per-provider data stores and the migrator that relocates them.
//!
//! A [`PerProviderData<T>`] maps provider handles to one kind of auxiliary
//! value (bookmarks, settings, undo stacks…). The subsystem defining the
//! kind owns the store; the [`ProviderDataMigrator`] visits every store
//! generically when a provider is replaced, via the object-safe
//! [`DataStore`] trait.
//!
//! ## Rules
//! - Stores self-register with the migrator on construction and are held as
//!   `Weak` references; dropping a store removes it from migration visits.
//! - After `migrate(from, to)`, every store that held an entry for `from`
//!   holds that entry (unchanged value) for `to`, and no store holds an
//!   entry for `from`. A pre-existing entry for `to` is overwritten — `to`
//!   is assumed freshly created and empty; violating that is a caller error.
//! - Re-running a migration over an already-empty `from` is a no-op per
//!   store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use crate::providers::provider::ProviderHandle;

/// Generic view of one per-provider store, used by the migrator.
trait DataStore: Send + Sync {
    /// Moves the entry keyed by `from` (if any) to `to`, overwriting.
    fn relocate(&self, from: ProviderHandle, to: ProviderHandle);

    /// Drops the entry keyed by `handle` (if any).
    fn discard(&self, handle: ProviderHandle);
}

struct Store<T> {
    entries: Mutex<HashMap<ProviderHandle, T>>,
}

impl<T: Send + 'static> DataStore for Store<T> {
    fn relocate(&self, from: ProviderHandle, to: ProviderHandle) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(value) = entries.remove(&from) {
            entries.insert(to, value);
        }
    }

    fn discard(&self, handle: ProviderHandle) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle);
    }
}

/// One kind of auxiliary data attached to providers, keyed by handle.
///
/// Cloning shares the underlying store. The store stays registered with the
/// migrator for as long as any clone is alive.
pub struct PerProviderData<T: Send + 'static> {
    inner: Arc<Store<T>>,
}

impl<T: Send + 'static> PerProviderData<T> {
    /// Creates a store and registers it for migration visits.
    #[must_use]
    pub fn new(migrator: &ProviderDataMigrator) -> Self {
        let inner = Arc::new(Store {
            entries: Mutex::new(HashMap::new()),
        });
        migrator.register(Arc::downgrade(&inner) as Weak<dyn DataStore>);
        Self { inner }
    }

    /// Sets the value for `handle`, returning the previous one.
    pub fn insert(&self, handle: ProviderHandle, value: T) -> Option<T> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle, value)
    }

    /// Clones the value for `handle`.
    pub fn get(&self, handle: ProviderHandle) -> Option<T>
    where
        T: Clone,
    {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&handle)
            .cloned()
    }

    /// Runs `f` over the value for `handle`, if present.
    pub fn with<R>(&self, handle: ProviderHandle, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&handle)
            .map(f)
    }

    /// Runs `f` over the mutable value for `handle`, if present.
    pub fn with_mut<R>(&self, handle: ProviderHandle, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&handle)
            .map(f)
    }

    /// Removes and returns the value for `handle`.
    pub fn remove(&self, handle: ProviderHandle) -> Option<T> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle)
    }

    /// True if a value is stored for `handle`.
    pub fn contains(&self, handle: ProviderHandle) -> bool {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&handle)
    }

    /// Number of providers with a stored value.
    pub fn len(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// True if no provider has a stored value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send + 'static> Clone for PerProviderData<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Relocates all per-provider data from one provider to another.
///
/// Holds every registered store weakly and visits them generically; the
/// caller (the move-data subscriber installed by
/// [`AppContext`](crate::AppContext)) validates handles before invoking
/// [`migrate`](Self::migrate).
pub struct ProviderDataMigrator {
    stores: Mutex<Vec<Weak<dyn DataStore>>>,
}

impl ProviderDataMigrator {
    /// Creates a migrator with no registered stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(Vec::new()),
        }
    }

    fn register(&self, store: Weak<dyn DataStore>) {
        self.stores
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(store);
    }

    /// Moves every store's entry for `from` to `to`.
    ///
    /// Postcondition: no store holds an entry for `from`; `from` is expected
    /// to be destroyed immediately after this returns.
    pub fn migrate(&self, from: ProviderHandle, to: ProviderHandle) {
        trace!(%from, %to, "migrating per-provider data");
        for store in self.live_stores() {
            store.relocate(from, to);
        }
    }

    /// Drops every store's entry for `handle` (used on provider destroy).
    pub fn discard(&self, handle: ProviderHandle) {
        for store in self.live_stores() {
            store.discard(handle);
        }
    }

    /// Number of currently registered (live) stores.
    pub fn store_count(&self) -> usize {
        self.live_stores().len()
    }

    /// Upgrades live stores and prunes dropped ones.
    fn live_stores(&self) -> Vec<Arc<dyn DataStore>> {
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        stores.retain(|w| w.strong_count() > 0);
        stores.iter().filter_map(Weak::upgrade).collect()
    }
}

impl Default for ProviderDataMigrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(raw: u64) -> ProviderHandle {
        ProviderHandle::new(raw)
    }

    #[test]
    fn test_migrate_moves_entry_and_clears_source() {
        let migrator = ProviderDataMigrator::new();
        let bookmarks: PerProviderData<Vec<u64>> = PerProviderData::new(&migrator);

        let (a, b) = (handle(1), handle(2));
        bookmarks.insert(a, vec![10, 20]);
        assert!(!bookmarks.contains(b));

        migrator.migrate(a, b);

        assert_eq!(bookmarks.get(b), Some(vec![10, 20]));
        assert!(!bookmarks.contains(a));

        // Re-running over the now-empty source is a no-op.
        migrator.migrate(a, b);
        assert_eq!(bookmarks.get(b), Some(vec![10, 20]));
    }

    #[test]
    fn test_migrate_visits_every_store() {
        let migrator = ProviderDataMigrator::new();
        let bookmarks: PerProviderData<&'static str> = PerProviderData::new(&migrator);
        let settings: PerProviderData<u32> = PerProviderData::new(&migrator);

        let (a, b) = (handle(1), handle(2));
        bookmarks.insert(a, "marked");
        settings.insert(a, 7);

        migrator.migrate(a, b);

        assert_eq!(bookmarks.get(b), Some("marked"));
        assert_eq!(settings.get(b), Some(7));
        assert!(!bookmarks.contains(a));
        assert!(!settings.contains(a));
    }

    #[test]
    fn test_migrate_overwrites_target_entry() {
        let migrator = ProviderDataMigrator::new();
        let store: PerProviderData<u32> = PerProviderData::new(&migrator);

        let (a, b) = (handle(1), handle(2));
        store.insert(a, 1);
        store.insert(b, 2); // caller error per contract; the move wins
        migrator.migrate(a, b);

        assert_eq!(store.get(b), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_dropped_store_is_pruned() {
        let migrator = ProviderDataMigrator::new();
        let store: PerProviderData<u32> = PerProviderData::new(&migrator);
        assert_eq!(migrator.store_count(), 1);

        drop(store);
        assert_eq!(migrator.store_count(), 0);
        // Migration over no stores is harmless.
        migrator.migrate(handle(1), handle(2));
    }

    #[test]
    fn test_discard_clears_all_stores() {
        let migrator = ProviderDataMigrator::new();
        let bookmarks: PerProviderData<&'static str> = PerProviderData::new(&migrator);
        let settings: PerProviderData<u32> = PerProviderData::new(&migrator);

        let a = handle(1);
        bookmarks.insert(a, "marked");
        settings.insert(a, 7);

        migrator.discard(a);
        assert!(bookmarks.is_empty());
        assert!(settings.is_empty());
    }

    #[test]
    fn test_with_mut_updates_in_place() {
        let migrator = ProviderDataMigrator::new();
        let store: PerProviderData<Vec<u32>> = PerProviderData::new(&migrator);

        let a = handle(1);
        store.insert(a, vec![1]);
        store.with_mut(a, |v| v.push(2));
        assert_eq!(store.get(a), Some(vec![1, 2]));
        assert_eq!(store.with(a, Vec::len), Some(2));
    }
}
