//! # Typed event-kind and request-kind tokens.
//!
//! An event kind is a value-object naming one channel of the bus. The token
//! carries the channel's parameter type (and, for requests, the result type)
//! as a phantom signature, so a publication with a mismatched argument list
//! fails type-checking at the call site instead of at runtime.
//!
//! ## Identity
//! The **name** is the identity, unique within the process. Independently
//! built plugins interoperate by declaring a kind with the same name and
//! signature; they never need to link against each other. The registry
//! records the signature's `TypeId` on first definition and rejects a
//! conflicting redefinition loudly.
//!
//! ## Example
//! ```rust
//! use appvisor::events::{EventKind, RequestKind};
//!
//! // Declared as consts, typically in a shared "well-known kinds" module.
//! pub const CACHE_INVALIDATED: EventKind<String> =
//!     EventKind::new("appvisor.demo.cache_invalidated");
//! pub const REQUEST_SUM: RequestKind<(u32, u32), u32> =
//!     RequestKind::new("appvisor.demo.request_sum");
//! ```

use std::marker::PhantomData;

/// Typed token identifying one publish/subscribe channel.
///
/// `A` is the parameter payload delivered to subscribers by reference.
/// Tokens are cheap `Copy` values; two tokens with the same name refer to the
/// same channel regardless of where they were declared.
pub struct EventKind<A: 'static> {
    name: &'static str,
    _params: PhantomData<fn(&A)>,
}

impl<A: 'static> EventKind<A> {
    /// Declares an event kind with the given process-unique name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _params: PhantomData,
        }
    }

    /// Returns the kind's name (its process-wide identity).
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<A: 'static> Clone for EventKind<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: 'static> Copy for EventKind<A> {}

impl<A: 'static> std::fmt::Debug for EventKind<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EventKind").field(&self.name).finish()
    }
}

/// Typed token identifying one request/response channel.
///
/// `A` is the parameter payload; `R` is the result produced by the single
/// handler. Unlike [`EventKind`], a request kind has exactly one answering
/// subscriber and publication returns a value to the caller.
pub struct RequestKind<A: 'static, R: 'static> {
    name: &'static str,
    _signature: PhantomData<fn(&A) -> R>,
}

impl<A: 'static, R: 'static> RequestKind<A, R> {
    /// Declares a request kind with the given process-unique name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _signature: PhantomData,
        }
    }

    /// Returns the kind's name (its process-wide identity).
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<A: 'static, R: 'static> Clone for RequestKind<A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: 'static, R: 'static> Copy for RequestKind<A, R> {}

impl<A: 'static, R: 'static> std::fmt::Debug for RequestKind<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RequestKind").field(&self.name).finish()
    }
}

/// Identifier of one subscription on the [`EventRegistry`](crate::EventRegistry).
///
/// The serial reflects registration order within the kind. Ids stay valid as
/// removal tokens forever: unsubscribing an id that was never issued, or one
/// that was already removed, is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub(crate) kind: &'static str,
    pub(crate) serial: u64,
}

impl SubscriptionId {
    /// Name of the kind this subscription belongs to.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

/// Identifier of the handler installed on a request kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestHandlerId {
    pub(crate) kind: &'static str,
    pub(crate) serial: u64,
}

impl RequestHandlerId {
    /// Name of the request kind this handler answers.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_copy_and_named() {
        const K: EventKind<u32> = EventKind::new("test.kind");
        let a = K;
        let b = K;
        assert_eq!(a.name(), b.name());
        assert_eq!(a.name(), "test.kind");
    }

    #[test]
    fn test_request_token_named() {
        const R: RequestKind<String, u64> = RequestKind::new("test.request");
        assert_eq!(R.name(), "test.request");
    }
}
