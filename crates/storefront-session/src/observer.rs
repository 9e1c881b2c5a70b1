//! # Change Notification
//!
//! Every engine publishes its state to subscribed listeners after each
//! mutation. Rendering layers subscribe; engines never know what renders.
//!
//! ## Notification Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine.add_item(..)                                                    │
//! │     │                                                                   │
//! │     ├── lock state ── mutate ── clone snapshot ── unlock                │
//! │     │                                                                   │
//! │     └── listeners.notify(&snapshot)   (no engine lock held)            │
//! │            ├── listener A(&snapshot)                                    │
//! │            └── listener B(&snapshot)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Listeners only ever see fully applied mutations, and may call back into
//! the engine without deadlocking.
//!
//! ## Ordering
//! Calls made from one thread notify in the order they mutated. Because
//! notification runs after the lock is released, calls racing on several
//! threads may deliver an older snapshot last. Every published state carries
//! a `revision` that grows by one per change under the lock; a listener fed
//! from several threads keeps the highest revision it has seen.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A state-change callback.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by `on_change`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The subscribe/notify contract shared by all engines.
pub trait Observable {
    /// What listeners receive.
    type State;

    /// A copy of the current state.
    fn snapshot(&self) -> Self::State;

    /// Registers a listener called after every state change.
    fn on_change(&self, listener: Listener<Self::State>) -> SubscriptionId;

    /// Removes a listener. Returns false if it was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Listener registry owned by an engine.
pub struct Listeners<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Listeners {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Listener<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Calls every listener with `state`, in subscription order.
    pub fn notify(&self, state: &T) {
        // Clone out so listeners can subscribe/unsubscribe re-entrantly.
        let listeners: Vec<Listener<T>> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener(state);
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_in_subscription_order() {
        let listeners: Listeners<u32> = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::clone(&seen);
        listeners.subscribe(Arc::new(move |v: &u32| a.lock().unwrap().push(("a", *v))));
        let b = Arc::clone(&seen);
        listeners.subscribe(Arc::new(move |v: &u32| b.lock().unwrap().push(("b", *v))));

        listeners.notify(&7);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe() {
        let listeners: Listeners<()> = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let id = listeners.subscribe(Arc::new(move |_: &()| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.notify(&());
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.notify(&());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }
}
