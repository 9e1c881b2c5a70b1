//! # Wishlist Engine
//!
//! Saved-for-later products, keyed by product id, plus drawer visibility.
//!
//! Membership is a key lookup: adding an id that is already present
//! overwrites the entry, and `toggle` flips membership based on `has`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use storefront_core::{ProductId, WishItem};

use crate::cart::CartEngine;
use crate::observer::{Listener, Listeners, Observable, SubscriptionId};

/// Wishlist state. Entries list in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    pub items: BTreeMap<ProductId, WishItem>,
    pub is_open: bool,
    /// Bumped on every published change.
    #[serde(default)]
    pub revision: u64,
}

impl Wishlist {
    pub fn has(&self, id: ProductId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Default)]
struct WishlistShared {
    state: Mutex<Wishlist>,
    listeners: Listeners<Wishlist>,
}

/// Session-scoped wishlist engine. All operations are total.
#[derive(Debug, Clone, Default)]
pub struct WishlistEngine {
    shared: Arc<WishlistShared>,
}

impl WishlistEngine {
    pub fn new() -> Self {
        WishlistEngine::default()
    }

    fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Wishlist) -> R,
    {
        let state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Wishlist) -> bool,
    {
        let snapshot = {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !f(&mut state) {
                return false;
            }
            state.revision += 1;
            state.clone()
        };
        self.shared.listeners.notify(&snapshot);
        true
    }

    /// Inserts or overwrites by id.
    pub fn add(&self, item: WishItem) {
        let id = item.id;
        self.mutate(|state| {
            let previous = state.items.insert(item.id, item.clone());
            previous.as_ref() != Some(&item)
        });
        debug!(id, "wishlist item saved");
    }

    /// Deletes by id; no-op if absent.
    pub fn remove(&self, id: ProductId) {
        if self.mutate(|state| state.items.remove(&id).is_some()) {
            debug!(id, "wishlist item removed");
        }
    }

    pub fn has(&self, id: ProductId) -> bool {
        self.read(|state| state.has(id))
    }

    /// Removes if present, else adds. Returns the new membership.
    ///
    /// The decision and the change happen under one lock, so repeated
    /// toggles strictly alternate.
    pub fn toggle(&self, item: WishItem) -> bool {
        let id = item.id;
        let mut now_member = false;
        self.mutate(|state| {
            if state.has(id) {
                state.items.remove(&id);
            } else {
                state.items.insert(id, item);
                now_member = true;
            }
            true
        });
        debug!(id, now_member, "wishlist toggled");
        now_member
    }

    /// Flips drawer visibility.
    pub fn toggle_open(&self) {
        self.mutate(|state| {
            state.is_open = !state.is_open;
            true
        });
    }

    pub fn is_open(&self) -> bool {
        self.read(|state| state.is_open)
    }

    pub fn get(&self, id: ProductId) -> Option<WishItem> {
        self.read(|state| state.items.get(&id).cloned())
    }

    /// Entries in ascending id order.
    pub fn items(&self) -> Vec<WishItem> {
        self.read(|state| state.items.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.read(Wishlist::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(Wishlist::is_empty)
    }

    /// Adds one unit of a saved product to the cart. The wishlist keeps the
    /// entry. Returns false if `id` is not saved.
    pub fn promote_to_cart(&self, id: ProductId, cart: &CartEngine) -> bool {
        match self.get(id) {
            Some(item) => {
                cart.add_item(item.to_cart_item());
                debug!(id, "wishlist item promoted to cart");
                true
            }
            None => false,
        }
    }
}

impl Observable for WishlistEngine {
    type State = Wishlist;

    fn snapshot(&self) -> Wishlist {
        self.read(Wishlist::clone)
    }

    fn on_change(&self, listener: Listener<Wishlist>) -> SubscriptionId {
        self.shared.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.listeners.unsubscribe(id)
    }
}
