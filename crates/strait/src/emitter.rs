//! Listener registry — ordered callback fan-out per event kind.
//!
//! Listeners are invoked synchronously in registration order. Registering a
//! listener fires a `NewListener` meta-event BEFORE the listener lands, so
//! meta-listeners never observe the listener they are being told about.
//! Removal fires `RemoveListener` after the listener is gone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use strait_core::{BridgeEvent, EventKind};

/// Callback invoked for every event of the subscribed kind.
pub type Listener = Box<dyn FnMut(&BridgeEvent) + Send>;

/// Soft cap on listeners per event kind. Exceeding it logs a warning but
/// the listener is still registered.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Identifies one registered listener, for unsubscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    kind: EventKind,
    id: u64,
}

impl SubscriptionHandle {
    /// The event kind this subscription is registered under.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

struct Entry {
    id: u64,
    once: bool,
    // Callbacks are invoked outside the registry lock so a listener may
    // subscribe or unsubscribe from within its own invocation.
    callback: Arc<Mutex<Listener>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    max_listeners: usize,
    by_kind: HashMap<EventKind, Vec<Entry>>,
}

/// Ordered listener registry for one bridge.
pub struct Emitter {
    registry: Mutex<Registry>,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 0,
                max_listeners: DEFAULT_MAX_LISTENERS,
                by_kind: HashMap::new(),
            }),
        }
    }

    /// Register a listener for `kind`. Invoked for every matching event
    /// until unsubscribed.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&BridgeEvent) + Send + 'static,
    {
        self.add(kind, Box::new(callback), false)
    }

    /// Register a listener that fires at most once, then removes itself.
    pub fn subscribe_once<F>(&self, kind: EventKind, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&BridgeEvent) + Send + 'static,
    {
        self.add(kind, Box::new(callback), true)
    }

    fn add(&self, kind: EventKind, callback: Listener, once: bool) -> SubscriptionHandle {
        // Meta-event fires before the listener is added.
        self.emit(&BridgeEvent::NewListener(kind));

        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id;
        registry.next_id += 1;
        let max_listeners = registry.max_listeners;
        let entries = registry.by_kind.entry(kind).or_default();
        if entries.len() >= max_listeners {
            tracing::warn!(
                ?kind,
                count = entries.len() + 1,
                max_listeners,
                "listener count exceeds max_listeners"
            );
        }
        entries.push(Entry {
            id,
            once,
            callback: Arc::new(Mutex::new(callback)),
        });
        SubscriptionHandle { kind, id }
    }

    /// Remove a listener. Returns false if the handle was already gone.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let removed = {
            let mut registry = self.registry.lock().unwrap();
            match registry.by_kind.get_mut(&handle.kind) {
                Some(entries) => {
                    let before = entries.len();
                    entries.retain(|e| e.id != handle.id);
                    entries.len() < before
                }
                None => false,
            }
        };
        if removed {
            self.emit(&BridgeEvent::RemoveListener(handle.kind));
        }
        removed
    }

    /// Remove every listener for `kind`, or all listeners when `None`.
    /// Returns how many were removed.
    pub fn remove_all(&self, kind: Option<EventKind>) -> usize {
        let mut registry = self.registry.lock().unwrap();
        match kind {
            Some(kind) => registry
                .by_kind
                .get_mut(&kind)
                .map(|entries| {
                    let n = entries.len();
                    entries.clear();
                    n
                })
                .unwrap_or(0),
            None => {
                let n = registry.by_kind.values().map(Vec::len).sum();
                registry.by_kind.clear();
                n
            }
        }
    }

    /// Deliver an event to every listener of its kind, in registration
    /// order. Once-listeners are removed before their only invocation.
    pub fn emit(&self, event: &BridgeEvent) {
        let callbacks: Vec<Arc<Mutex<Listener>>> = {
            let mut registry = self.registry.lock().unwrap();
            let Some(entries) = registry.by_kind.get_mut(&event.kind()) else {
                return;
            };
            let snapshot = entries.iter().map(|e| e.callback.clone()).collect();
            entries.retain(|e| !e.once);
            snapshot
        };
        for callback in callbacks {
            let mut callback = callback.lock().unwrap();
            (*callback)(event);
        }
    }

    /// Number of listeners currently registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .lock()
            .unwrap()
            .by_kind
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn max_listeners(&self) -> usize {
        self.registry.lock().unwrap().max_listeners
    }

    pub fn set_max_listeners(&self, n: usize) {
        self.registry.lock().unwrap().max_listeners = n;
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
