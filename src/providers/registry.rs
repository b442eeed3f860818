//! # ProviderRegistry: owns the live set of provider instances.
//!
//! The registry resolves factories by unlocalized name, performs
//! all-or-nothing creation (`configure → load → validate`, register last),
//! and owns every live provider for its lifetime. Handles are monotonic and
//! never reused.
//!
//! Event wiring (the creation-request handler and the teardown notification
//! ordering) lives in [`AppContext`](crate::AppContext); this type is the
//! ownership structure underneath it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::debug;

use crate::error::CreateError;
use crate::providers::factory::ProviderFactory;
use crate::providers::provider::{ProviderHandle, ProviderRef};

/// Live set of providers plus the factories that create them.
pub struct ProviderRegistry {
    factories: DashMap<String, Arc<dyn ProviderFactory>>,
    providers: Mutex<HashMap<ProviderHandle, ProviderRef>>,
    next_handle: AtomicU64,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
            providers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Registers a factory under its unlocalized name. Re-registering a name
    /// replaces the previous factory.
    pub fn register_factory(&self, factory: Arc<dyn ProviderFactory>) {
        let name = factory.name().to_string();
        debug!(factory = %name, "provider factory registered");
        self.factories.insert(name, factory);
    }

    /// Returns the sorted list of registered factory names.
    pub fn factory_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Resolves `name` and runs the creation sequence.
    ///
    /// `configure(interactive)` → `load()` → `validate()`; the provider is
    /// inserted into the live set only after all three succeed, so a failure
    /// at any step leaves no partial registration behind.
    pub fn create(
        &self,
        name: &str,
        skip_load_interface: bool,
    ) -> Result<ProviderHandle, CreateError> {
        let factory = self
            .factories
            .get(name)
            .map(|f| Arc::clone(&f))
            .ok_or_else(|| CreateError::UnknownFactory {
                name: name.to_string(),
            })?;

        factory.configure(!skip_load_interface)?;
        let provider = factory.load()?;
        factory.validate(&provider)?;

        let handle = ProviderHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle, provider);

        debug!(%handle, factory = name, "provider created");
        Ok(handle)
    }

    /// Resolves a handle to its provider, or `None` after destruction.
    pub fn get(&self, handle: ProviderHandle) -> Option<ProviderRef> {
        self.providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&handle)
            .cloned()
    }

    /// True while the handle resolves to a live provider.
    pub fn contains(&self, handle: ProviderHandle) -> bool {
        self.providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&handle)
    }

    /// Number of live providers.
    pub fn len(&self) -> usize {
        self.providers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True if no providers are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the sorted list of live handles.
    pub fn handles(&self) -> Vec<ProviderHandle> {
        let mut handles: Vec<ProviderHandle> = self
            .providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Atomically removes a handle from the live set.
    pub(crate) fn take(&self, handle: ProviderHandle) -> Option<ProviderRef> {
        self.providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::provider::Provider;

    struct MemProvider {
        label: String,
    }

    impl Provider for MemProvider {
        fn kind(&self) -> &str {
            "mem"
        }
        fn display_name(&self) -> String {
            self.label.clone()
        }
    }

    struct MemFactory {
        fail_validate: bool,
    }

    impl ProviderFactory for MemFactory {
        fn name(&self) -> &str {
            "mem"
        }
        fn load(&self) -> Result<ProviderRef, CreateError> {
            Ok(Arc::new(MemProvider {
                label: "in-memory".into(),
            }))
        }
        fn validate(&self, _provider: &ProviderRef) -> Result<(), CreateError> {
            if self.fail_validate {
                Err(CreateError::Validate {
                    reason: "corrupt".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_unknown_factory_leaves_set_unchanged() {
        let reg = ProviderRegistry::new();
        let before = reg.len();
        let err = reg.create("nonexistent-factory", false).unwrap_err();
        assert_eq!(err.as_label(), "create_unknown_factory");
        assert_eq!(reg.len(), before);
    }

    #[test]
    fn test_creation_is_all_or_nothing() {
        let reg = ProviderRegistry::new();
        reg.register_factory(Arc::new(MemFactory { fail_validate: true }));

        let err = reg.create("mem", false).unwrap_err();
        assert_eq!(err.as_label(), "create_validate_failed");
        assert!(reg.is_empty());
    }

    #[test]
    fn test_handles_are_not_reused() {
        let reg = ProviderRegistry::new();
        reg.register_factory(Arc::new(MemFactory {
            fail_validate: false,
        }));

        let first = reg.create("mem", false).unwrap();
        assert!(reg.take(first).is_some());
        let second = reg.create("mem", false).unwrap();

        assert_ne!(first, second);
        assert!(!reg.contains(first));
        assert!(reg.contains(second));
    }

    #[test]
    fn test_factory_names_sorted() {
        struct Named(&'static str);
        impl ProviderFactory for Named {
            fn name(&self) -> &str {
                self.0
            }
            fn load(&self) -> Result<ProviderRef, CreateError> {
                Err(CreateError::Load {
                    reason: "unused".into(),
                })
            }
        }

        let reg = ProviderRegistry::new();
        reg.register_factory(Arc::new(Named("zip")));
        reg.register_factory(Arc::new(Named("disk")));
        assert_eq!(reg.factory_names(), vec!["disk", "zip"]);
    }
}
