//! Subscriber registry — fans flow events out to handlers
//!
//! Handlers are unique by identity: registering the same `Arc` twice yields
//! one entry. Dispatch runs in registration order. The registry lock is not
//! held while handlers run, so a handler may subscribe or unsubscribe from
//! inside its own callback.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::events::FlowEvent;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// A flow event callback
pub type EventHandler = Arc<dyn Fn(&FlowEvent) + Send + Sync>;

/// Registration handle, increasing in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
struct RegistryInner {
    handlers: Mutex<BTreeMap<SubscriptionId, EventHandler>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn handlers(&self) -> MutexGuard<'_, BTreeMap<SubscriptionId, EventHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Token returned by `subscribe`.
///
/// `unsubscribe` removes exactly the registration this token was issued for
/// and is idempotent. Dropping the token leaves the handler registered.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn unsubscribe(&self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.handlers().remove(&self.id);
        }
    }

    /// Whether the registration is still live
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map_or(false, |inner| inner.handlers().contains_key(&self.id))
    }
}

impl std::fmt::Debug for RegistryInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryInner")
            .field("handlers", &self.handlers().len())
            .finish()
    }
}

/// The set of handlers receiving an adapter's flow events
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<RegistryInner>,
}

fn same_handler(a: &EventHandler, b: &EventHandler) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for future events.
    ///
    /// Re-registering a handler that is already present returns a token for
    /// the existing registration.
    pub fn subscribe(&self, handler: EventHandler) -> Subscription {
        let mut handlers = self.inner.handlers();
        let existing = handlers
            .iter()
            .find(|(_, h)| same_handler(h, &handler))
            .map(|(id, _)| *id);

        let id = match existing {
            Some(id) => id,
            None => {
                let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
                handlers.insert(id, handler);
                id
            }
        };

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every handler registered at call time.
    ///
    /// A handler unsubscribed before dispatch reaches it is skipped, even if
    /// the unsubscribe came from an earlier handler in the same dispatch.
    /// A panicking handler is reported through `diagnostics` and does not
    /// prevent delivery to the handlers after it. Returns the number of
    /// handlers that completed normally.
    pub fn emit(&self, event: &FlowEvent, diagnostics: &dyn Diagnostics) -> usize {
        let handlers: Vec<(SubscriptionId, EventHandler)> = self
            .inner
            .handlers()
            .iter()
            .map(|(id, h)| (*id, h.clone()))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            if !self.inner.handlers().contains_key(&id) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => diagnostics.report(Diagnostic::HandlerPanicked {
                    subscription: id,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
        delivered
    }

    /// Drop every registration. Outstanding tokens become no-ops.
    pub fn clear(&self) {
        self.inner.handlers().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.handlers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
