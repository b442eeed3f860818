//! # RequestChannel: request/response layered over pub/sub.
//!
//! A request kind is an event kind with exactly **one** answering subscriber.
//! Publication ([`request`](RequestChannel::request)) synchronously invokes
//! the sole handler and hands its result back to the caller.
//!
//! ## Rules
//! - **Single handler**: installing a second handler for the same kind is
//!   rejected ([`BusError::HandlerExists`]) — ownership of "the" answer must
//!   be unambiguous. The first handler stays installed.
//! - **Explicit outcomes**: a handler returns `Option<R>`; `None` means the
//!   handler declined (failure), and the caller also observes `None` when no
//!   handler is installed at all. No panics cross the plugin boundary.
//! - **Reentrancy**: the handler runs without any channel lock held, so it
//!   may itself issue other requests. Same-kind reentrant requests are a
//!   caller error by contract (the answer would come from the very handler
//!   that is already on the stack).
//! - **Fast resolutions only**: requests are synchronous name lookups and
//!   registrations; long-running work belongs to the task pool, not the bus.
//!
//! ## Example
//! ```rust
//! use appvisor::events::{RequestChannel, RequestKind};
//!
//! const REQUEST_DOUBLE: RequestKind<u32, u32> = RequestKind::new("demo.double");
//!
//! let channel = RequestChannel::new();
//! let id = channel
//!     .handle(REQUEST_DOUBLE, |n: &u32| Some(n * 2))
//!     .expect("first handler");
//! assert_eq!(channel.request(REQUEST_DOUBLE, &21), Some(42));
//! channel.release(id);
//! assert_eq!(channel.request(REQUEST_DOUBLE, &21), None);
//! ```

use std::any::{Any, TypeId, type_name};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::trace;

use super::kind::{RequestHandlerId, RequestKind};
use crate::error::BusError;

/// Boxed request handler for a kind with parameters `A` and result `R`.
type Handler<A, R> = Box<dyn Fn(&A) -> Option<R> + Send + Sync>;

struct HandlerSlot {
    serial: u64,
    callback: Arc<dyn Any + Send + Sync>,
}

struct RequestEntry {
    name: &'static str,
    params: TypeId,
    result: TypeId,
    signature_name: &'static str,
    slot: Mutex<(u64, Option<HandlerSlot>)>,
}

impl RequestEntry {
    fn new<A: 'static, R: 'static>(name: &'static str) -> Self {
        Self {
            name,
            params: TypeId::of::<A>(),
            result: TypeId::of::<R>(),
            signature_name: type_name::<fn(&A) -> R>(),
            slot: Mutex::new((0, None)),
        }
    }

    fn check_signature<A: 'static, R: 'static>(&self) {
        if self.params != TypeId::of::<A>() || self.result != TypeId::of::<R>() {
            panic!(
                "request kind `{}` redefined with conflicting signature: registered as {}, used as {}",
                self.name,
                self.signature_name,
                type_name::<fn(&A) -> R>(),
            );
        }
    }
}

/// Request/response channel with exactly one handler per kind.
///
/// Context-scoped, like [`EventRegistry`](crate::EventRegistry): recreated
/// fresh per lifecycle iteration. All methods take `&self` and are safe to
/// call from any thread.
pub struct RequestChannel {
    kinds: DashMap<&'static str, Arc<RequestEntry>>,
}

impl RequestChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: DashMap::new(),
        }
    }

    /// Registers a request kind. Idempotent; a conflicting signature panics.
    pub fn define<A: 'static, R: 'static>(&self, kind: RequestKind<A, R>) {
        let entry = self
            .kinds
            .entry(kind.name())
            .or_insert_with(|| Arc::new(RequestEntry::new::<A, R>(kind.name())))
            .clone();
        entry.check_signature::<A, R>();
    }

    /// Installs the handler answering this request kind.
    ///
    /// Auto-defines the kind. Returns [`BusError::HandlerExists`] if a handler
    /// is already installed; the existing handler is **not** replaced.
    pub fn handle<A, R, F>(
        &self,
        kind: RequestKind<A, R>,
        handler: F,
    ) -> Result<RequestHandlerId, BusError>
    where
        A: 'static,
        R: 'static,
        F: Fn(&A) -> Option<R> + Send + Sync + 'static,
    {
        self.define(kind);
        let entry = self.expect_entry(kind.name());

        let mut slot = entry.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.1.is_some() {
            return Err(BusError::HandlerExists { kind: kind.name() });
        }
        let serial = slot.0;
        slot.0 += 1;
        slot.1 = Some(HandlerSlot {
            serial,
            callback: Arc::new(Box::new(handler) as Handler<A, R>),
        });

        trace!(kind = kind.name(), serial, "request handler installed");
        Ok(RequestHandlerId {
            kind: kind.name(),
            serial,
        })
    }

    /// Removes the handler identified by `id`. Idempotent: an id that no
    /// longer matches the installed handler is a no-op.
    pub fn release(&self, id: RequestHandlerId) {
        let Some(entry) = self.kinds.get(id.kind).map(|e| Arc::clone(&e)) else {
            return;
        };
        let mut slot = entry.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.1.as_ref().is_some_and(|h| h.serial == id.serial) {
            slot.1 = None;
        }
    }

    /// Synchronously invokes the sole handler and returns its result.
    ///
    /// Returns `None` when no handler is installed or the handler reports
    /// failure. The handler runs without any channel lock held.
    ///
    /// # Panics
    /// If the kind was never defined (programmer error, same discipline as
    /// [`EventRegistry::publish`](crate::EventRegistry::publish)).
    pub fn request<A: 'static, R: 'static>(&self, kind: RequestKind<A, R>, args: &A) -> Option<R> {
        let entry = self.expect_entry(kind.name());
        entry.check_signature::<A, R>();

        let callback = {
            let slot = entry.slot.lock().unwrap_or_else(|e| e.into_inner());
            slot.1.as_ref().map(|h| Arc::clone(&h.callback))
        };

        let callback = match callback {
            Some(cb) => cb,
            None => {
                trace!(kind = kind.name(), "request with no handler");
                return None;
            }
        };
        callback
            .downcast_ref::<Handler<A, R>>()
            .and_then(|cb| cb(args))
    }

    /// True if a handler is currently installed for the kind.
    pub fn has_handler<A: 'static, R: 'static>(&self, kind: RequestKind<A, R>) -> bool {
        self.kinds
            .get(kind.name())
            .map(|e| {
                e.slot
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .1
                    .is_some()
            })
            .unwrap_or(false)
    }

    fn expect_entry(&self, name: &str) -> Arc<RequestEntry> {
        match self.kinds.get(name) {
            Some(e) => Arc::clone(&e),
            None => panic!(
                "request kind `{name}` used before being defined; \
                 define it (or install its handler) during initialization"
            ),
        }
    }
}

impl Default for RequestChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST_LEN: RequestKind<String, usize> = RequestKind::new("test.request.len");

    #[test]
    fn test_request_returns_handler_result() {
        let ch = RequestChannel::new();
        ch.handle(REQUEST_LEN, |s: &String| Some(s.len())).unwrap();
        assert_eq!(ch.request(REQUEST_LEN, &"four".to_string()), Some(4));
    }

    #[test]
    fn test_request_without_handler_is_none() {
        let ch = RequestChannel::new();
        ch.define(REQUEST_LEN);
        assert_eq!(ch.request(REQUEST_LEN, &"x".to_string()), None);
    }

    #[test]
    fn test_handler_failure_is_none() {
        const REQ: RequestKind<u32, u32> = RequestKind::new("test.request.failing");
        let ch = RequestChannel::new();
        ch.handle(REQ, |n: &u32| if *n > 10 { Some(*n) } else { None })
            .unwrap();
        assert_eq!(ch.request(REQ, &5), None);
        assert_eq!(ch.request(REQ, &11), Some(11));
    }

    #[test]
    fn test_second_handler_rejected_first_kept() {
        let ch = RequestChannel::new();
        ch.handle(REQUEST_LEN, |s: &String| Some(s.len())).unwrap();

        let err = ch.handle(REQUEST_LEN, |_: &String| Some(999)).unwrap_err();
        assert_eq!(
            err,
            BusError::HandlerExists {
                kind: "test.request.len"
            }
        );
        // The first handler still answers.
        assert_eq!(ch.request(REQUEST_LEN, &"abc".to_string()), Some(3));
    }

    #[test]
    fn test_release_is_idempotent() {
        let ch = RequestChannel::new();
        let id = ch.handle(REQUEST_LEN, |s: &String| Some(s.len())).unwrap();
        ch.release(id);
        ch.release(id);
        assert!(!ch.has_handler(REQUEST_LEN));

        // A fresh handler can be installed, and the stale id does not evict it.
        let id2 = ch.handle(REQUEST_LEN, |_: &String| Some(1)).unwrap();
        ch.release(id);
        assert!(ch.has_handler(REQUEST_LEN));
        ch.release(id2);
        assert!(!ch.has_handler(REQUEST_LEN));
    }

    #[test]
    fn test_handler_may_issue_other_requests() {
        const OUTER: RequestKind<u32, u32> = RequestKind::new("test.request.outer");
        const INNER: RequestKind<u32, u32> = RequestKind::new("test.request.inner");

        let ch = Arc::new(RequestChannel::new());
        ch.handle(INNER, |n: &u32| Some(n + 1)).unwrap();
        {
            let ch = Arc::clone(&ch);
            ch.clone()
                .handle(OUTER, move |n: &u32| ch.request(INNER, n).map(|m| m * 10))
                .unwrap();
        }
        assert_eq!(ch.request(OUTER, &4), Some(50));
    }

    #[test]
    #[should_panic(expected = "used before being defined")]
    fn test_request_undefined_kind_panics() {
        const REQ: RequestKind<u8, u8> = RequestKind::new("test.request.undefined");
        let ch = RequestChannel::new();
        ch.request(REQ, &0);
    }
}
