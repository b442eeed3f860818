//! # Provider identity: opaque handles and the session trait.

use std::fmt;
use std::sync::Arc;

/// Opaque, stable identity of a live provider.
///
/// Handles are monotonically increasing and never reused for the lifetime of
/// a registry, so a stale handle resolves to nothing rather than to a
/// different provider. The registry owns the provider; everyone else borrows
/// by handle.
///
/// A handle stops resolving once destruction is requested and the
/// [`PROVIDER_DESTROYED`](crate::events::wellknown::PROVIDER_DESTROYED)
/// notification has gone out — do not cache handles beyond that event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderHandle(u64);

impl ProviderHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value, for logs and diagnostics only.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider#{}", self.0)
    }
}

/// A data source session managed by the [`ProviderRegistry`](crate::ProviderRegistry).
///
/// Providers are created only through a registered
/// [`ProviderFactory`](crate::ProviderFactory) and destroyed only by the
/// registry, after all per-provider data referencing them has been migrated
/// or discarded.
pub trait Provider: Send + Sync + 'static {
    /// Unlocalized name of the factory this provider came from.
    fn kind(&self) -> &str;

    /// Human-readable session name for UI and logs.
    fn display_name(&self) -> String;

    /// Teardown hook, called once when the registry destroys the provider
    /// (after the destruction notification has been published).
    fn close(&self) {}
}

/// Shared reference to a provider.
pub type ProviderRef = Arc<dyn Provider>;
