//! # Cart Engine
//!
//! Owns the lines the user intends to purchase, plus drawer visibility.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` because:
//! 1. The checkout wizard holds a second handle to the same cart
//! 2. Only one operation should modify the cart at a time
//! 3. A multi-threaded host may call from several threads
//!
//! Each published change bumps `Cart::revision`. With callers on several
//! threads, notifications can reach a listener out of order; keep the
//! snapshot with the highest revision.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Engine Operations                               │
//! │                                                                         │
//! │  UI Action                Engine Call             Cart Change           │
//! │  ─────────                ───────────             ───────────           │
//! │                                                                         │
//! │  "Add to cart" ─────────► add_item() ───────────► push or qty += 1     │
//! │                                                                         │
//! │  − / + buttons ─────────► update_quantity() ────► qty = n, or remove   │
//! │                                                   when n ≤ 0           │
//! │                                                                         │
//! │  ✕ button ──────────────► remove_item() ────────► items.retain(..)     │
//! │                                                                         │
//! │  Order placed ──────────► clear_cart() ─────────► items.clear()        │
//! │                                                                         │
//! │  Badge / drawer ────────► get_total_items() ────► (read only)          │
//! │                           get_total_price()                             │
//! │                                                                         │
//! │  NOTE: listeners are notified after the lock is released.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use storefront_core::{CartItem, Money};

use crate::observer::{Listener, Listeners, Observable, SubscriptionId};

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `id` (adding the same product increases quantity)
/// - Quantity is always ≥ 1; a line whose quantity would drop to 0 is removed
/// - Insertion order is preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub is_open: bool,
    /// Bumped on every published change.
    #[serde(default)]
    pub revision: u64,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - Already in cart: quantity += 1; the stored name, price and image win
    /// - Not in cart: appended with quantity 1, whatever `item.quantity` says
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }

        self.items.push(CartItem { quantity: 1, ..item });
    }

    /// Sets a line's quantity. Returns false if nothing changed.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: removes the line
    /// - Otherwise sets it exactly (not additive, no upper bound)
    /// - Unknown id: no-op
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id);
        }

        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Removes a line. Returns false if it was not present.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let initial_len = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != initial_len
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities.
    pub fn total_items(&self) -> i64 {
        self.items
            .iter()
            .fold(0, |total, i| total.saturating_add(i.quantity))
    }

    /// Σ unit_price × quantity, exact to the cent.
    pub fn total_price(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart totals summary for badges and drawers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub distinct_items: usize,
    pub total_items: i64,
    pub total_price: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            distinct_items: cart.item_count(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
        }
    }
}

#[derive(Debug, Default)]
struct CartShared {
    cart: Mutex<Cart>,
    listeners: Listeners<Cart>,
}

/// Session-scoped cart engine.
///
/// Cloning yields another handle to the same cart; the checkout wizard holds
/// one of these.
#[derive(Debug, Clone, Default)]
pub struct CartEngine {
    shared: Arc<CartShared>,
}

impl CartEngine {
    /// Creates an engine with an empty, closed cart.
    pub fn new() -> Self {
        CartEngine::default()
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self
            .shared
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Applies `f` under the lock and notifies listeners if it reports a
    /// change.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Cart) -> bool,
    {
        let snapshot = {
            let mut cart = self
                .shared
                .cart
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !f(&mut cart) {
                return false;
            }
            cart.revision += 1;
            cart.clone()
        };
        self.shared.listeners.notify(&snapshot);
        true
    }

    /// Adds one unit of `item` (see [`Cart::add_item`]).
    pub fn add_item(&self, item: CartItem) {
        let id = item.id.clone();
        self.mutate(|cart| {
            cart.add_item(item);
            true
        });
        debug!(id = %id, total_items = self.get_total_items(), "cart item added");
    }

    /// Adds `times` units one call at a time, as the product page's quantity
    /// picker does.
    pub fn add_item_times(&self, item: CartItem, times: u32) {
        if times == 0 {
            return;
        }
        let id = item.id.clone();
        self.mutate(|cart| {
            for _ in 0..times {
                cart.add_item(item.clone());
            }
            true
        });
        debug!(id = %id, times, "cart item added repeatedly");
    }

    pub fn update_quantity(&self, id: &str, quantity: i64) {
        if self.mutate(|cart| cart.update_quantity(id, quantity)) {
            debug!(id = %id, quantity, "cart quantity updated");
        }
    }

    pub fn remove_item(&self, id: &str) {
        if self.mutate(|cart| cart.remove_item(id)) {
            debug!(id = %id, "cart item removed");
        }
    }

    /// Empties the cart. Called after a successful checkout.
    pub fn clear_cart(&self) {
        if self.mutate(|cart| {
            let had_items = !cart.is_empty();
            cart.clear();
            had_items
        }) {
            debug!("cart cleared");
        }
    }

    pub fn get_total_items(&self) -> i64 {
        self.with_cart(Cart::total_items)
    }

    /// Recomputed on every call; nothing is cached.
    pub fn get_total_price(&self) -> Money {
        self.with_cart(Cart::total_price)
    }

    pub fn totals(&self) -> CartTotals {
        self.with_cart(|cart| CartTotals::from(cart))
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.with_cart(|cart| cart.items.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.with_cart(Cart::is_empty)
    }

    pub fn is_open(&self) -> bool {
        self.with_cart(|cart| cart.is_open)
    }

    pub fn open_cart(&self) {
        self.set_open(true);
    }

    pub fn close_cart(&self) {
        self.set_open(false);
    }

    fn set_open(&self, open: bool) {
        self.mutate(|cart| {
            let changed = cart.is_open != open;
            cart.is_open = open;
            changed
        });
    }
}

impl Observable for CartEngine {
    type State = Cart;

    fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }

    fn on_change(&self, listener: Listener<Cart>) -> SubscriptionId {
        self.shared.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.listeners.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(id: &str, cents: i64) -> CartItem {
        CartItem::new(id, format!("Product {}", id), Money::from_cents(cents), "")
    }

    #[test]
    fn test_repeated_add_counts_calls() {
        let cart = CartEngine::new();
        for _ in 0..5 {
            cart.add_item(item("A", 999));
        }

        assert_eq!(cart.get_total_items(), 5);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_add_keeps_original_attributes() {
        let cart = CartEngine::new();
        cart.add_item(item("A", 1000));

        let mut changed = CartItem::new("A", "Renamed", Money::from_cents(1), "/x.png");
        changed.quantity = 40;
        cart.add_item(changed);

        let line = cart.with_cart(|c| c.get("A").cloned()).unwrap();
        assert_eq!(line.name, "Product A");
        assert_eq!(line.unit_price.cents(), 1000);
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_new_line_always_starts_at_one() {
        let cart = CartEngine::new();
        let mut big = item("A", 100);
        big.quantity = 9;
        cart.add_item(big);
        assert_eq!(cart.get_total_items(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let cart = CartEngine::new();
        cart.add_item(item("B", 1));
        cart.add_item(item("A", 1));
        cart.add_item(item("B", 1));

        let ids: Vec<String> = cart.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_update_quantity_sets_exactly() {
        let cart = CartEngine::new();
        cart.add_item(item("A", 100));
        cart.add_item(item("A", 100));

        cart.update_quantity("A", 7);
        assert_eq!(cart.get_total_items(), 7);

        cart.update_quantity("A", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_negative_removes_and_unknown_is_noop() {
        let cart = CartEngine::new();
        cart.add_item(item("A", 100));

        cart.update_quantity("missing", 3);
        assert_eq!(cart.get_total_items(), 1);

        cart.update_quantity("A", -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_item() {
        let cart = CartEngine::new();
        cart.add_item(item("A", 100));
        cart.add_item(item("B", 100));

        cart.remove_item("A");
        cart.remove_item("A");
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].id, "B");
    }

    #[test]
    fn test_totals_scenario() {
        let cart = CartEngine::new();
        cart.add_item(item("A", 1000));
        cart.add_item(item("A", 1000));
        cart.add_item(item("B", 550));

        assert_eq!(cart.get_total_items(), 3);
        assert_eq!(cart.get_total_price().cents(), 2550);
        assert_eq!(cart.get_total_price().to_string(), "$25.50");

        let totals = cart.totals();
        assert_eq!(totals.distinct_items, 2);
    }

    #[test]
    fn test_total_price_is_recomputed() {
        let cart = CartEngine::new();
        cart.add_item(item("A", 1000));
        assert_eq!(cart.get_total_price().cents(), 1000);

        cart.update_quantity("A", 3);
        assert_eq!(cart.get_total_price().cents(), 3000);
    }

    #[test]
    fn test_unbounded_quantity_keeps_totals_total() {
        let cart = CartEngine::new();
        cart.add_item(item("A", 10_000));
        cart.add_item(item("B", 550));
        cart.update_quantity("A", 1_000_000_000_000_000);

        assert_eq!(cart.get_total_items(), 1_000_000_000_000_001);
        assert_eq!(cart.get_total_price().cents(), i64::MAX);
        assert_eq!(cart.totals().total_price.cents(), i64::MAX);

        cart.update_quantity("B", i64::MAX);
        cart.add_item(item("B", 550));
        assert_eq!(cart.get_total_items(), i64::MAX);
    }

    #[test]
    fn test_add_item_times() {
        let cart = CartEngine::new();
        cart.add_item_times(item("A", 250), 4);
        cart.add_item_times(item("A", 250), 0);

        assert_eq!(cart.get_total_items(), 4);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_drawer_visibility() {
        let cart = CartEngine::new();
        assert!(!cart.is_open());
        cart.open_cart();
        assert!(cart.is_open());
        cart.close_cart();
        assert!(!cart.is_open());
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartEngine::new();
        let handle = cart.clone();
        handle.add_item(item("A", 100));
        assert_eq!(cart.get_total_items(), 1);

        cart.clear_cart();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_listeners_see_applied_state_and_skip_noops() {
        let cart = CartEngine::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let last_total = Arc::new(Mutex::new(0));

        let c = Arc::clone(&calls);
        let t = Arc::clone(&last_total);
        let id = cart.on_change(Arc::new(move |state: &Cart| {
            c.fetch_add(1, Ordering::SeqCst);
            *t.lock().unwrap() = state.total_items();
        }));

        cart.add_item(item("A", 100));
        cart.add_item(item("A", 100));
        assert_eq!(*last_total.lock().unwrap(), 2);

        cart.remove_item("missing");
        cart.close_cart();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(cart.unsubscribe(id));
        cart.clear_cart();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_read_engine() {
        let cart = CartEngine::new();
        let handle = cart.clone();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);

        cart.on_change(Arc::new(move |_: &Cart| {
            *s.lock().unwrap() = Some(handle.get_total_items());
        }));
        cart.add_item(item("A", 100));

        assert_eq!(*seen.lock().unwrap(), Some(1));
    }

    #[test]
    fn test_threaded_adds_keep_newest_by_revision() {
        let cart = CartEngine::new();
        let newest: Arc<Mutex<Option<Cart>>> = Arc::new(Mutex::new(None));
        let revisions = Arc::new(Mutex::new(Vec::new()));

        let n = Arc::clone(&newest);
        let r = Arc::clone(&revisions);
        cart.on_change(Arc::new(move |state: &Cart| {
            r.lock().unwrap().push(state.revision);
            let mut newest = n.lock().unwrap();
            if newest.as_ref().map_or(true, |kept| kept.revision < state.revision) {
                *newest = Some(state.clone());
            }
        }));

        let workers: Vec<_> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|id| {
                let cart = cart.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        cart.add_item(item(id, 100));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let kept = newest.lock().unwrap().clone().unwrap();
        assert_eq!(kept, cart.snapshot());
        assert_eq!(kept.revision, 200);
        assert_eq!(kept.total_items(), 200);

        let mut revisions = revisions.lock().unwrap().clone();
        revisions.sort_unstable();
        assert_eq!(revisions, (1..=200).collect::<Vec<u64>>());
    }
}
