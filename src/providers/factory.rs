//! # Provider factories.
//!
//! A factory is resolved by its unlocalized name and drives provider
//! creation through the capability set `{configure, load, validate}`.
//! Creation is all-or-nothing: the registry registers the provider only
//! after every step has succeeded, so a failure leaves nothing behind.

use crate::error::CreateError;
use crate::providers::provider::ProviderRef;

/// Named provider factory.
///
/// `configure` and `validate` have pass-through defaults; `load` is the one
/// mandatory capability. Each step reports failure through the disambiguating
/// [`CreateError`] variants so callers can log a precise reason.
pub trait ProviderFactory: Send + Sync + 'static {
    /// Unlocalized name under which this factory is resolved.
    fn name(&self) -> &str;

    /// Prepares creation. With `interactive == false` the factory must not
    /// trigger any interactive configuration step (headless/CLI creation
    /// paths pass `skip_load_interface = true`).
    fn configure(&self, interactive: bool) -> Result<(), CreateError> {
        let _ = interactive;
        Ok(())
    }

    /// Creates the provider instance.
    fn load(&self) -> Result<ProviderRef, CreateError>;

    /// Checks the loaded provider before it is registered.
    fn validate(&self, provider: &ProviderRef) -> Result<(), CreateError> {
        let _ = provider;
        Ok(())
    }
}
