//! # Storefront Session
//!
//! Creates and owns the engines for one shopper's visit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     StorefrontSession                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐             │
//! │  │ CartEngine   │  │ Wishlist     │  │ CatalogController │             │
//! │  │              │◄─│ Engine       │  │  Arc<dyn          │             │
//! │  │              │  │              │  │   ProductSearch>  │             │
//! │  └──────▲───────┘  └──────────────┘  └───────────────────┘             │
//! │         │ handle                                                        │
//! │  ┌──────┴───────────┐                                                   │
//! │  │ CheckoutWizard   │  created by begin_checkout(), one per attempt     │
//! │  │ Arc<dyn Order-   │                                                   │
//! │  │   Placement>     │                                                   │
//! │  └──────────────────┘                                                   │
//! │                                                                         │
//! │  Engines are cheap handles; cloning one shares its state.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use storefront_core::{ProductId, ProductSummary};

use crate::cart::{CartEngine, CartTotals};
use crate::catalog::CatalogController;
use crate::checkout::CheckoutWizard;
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::order::{OrderPlacement, SimulatedOrderPlacement};
use crate::search::ProductSearch;
use crate::wishlist::WishlistEngine;

/// What is left when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub cart: CartTotals,
    pub wishlist_items: usize,
}

pub struct StorefrontSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: SessionConfig,
    cart: CartEngine,
    wishlist: WishlistEngine,
    catalog: CatalogController,
    placement: Arc<dyn OrderPlacement>,
}

impl std::fmt::Debug for StorefrontSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontSession")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("cart", &self.cart)
            .field("wishlist", &self.wishlist)
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl StorefrontSession {
    pub fn new(
        config: SessionConfig,
        search: Arc<dyn ProductSearch>,
        placement: Arc<dyn OrderPlacement>,
    ) -> Self {
        let catalog = CatalogController::new(search, config.page_size())
            .with_max_search_length(config.catalog.max_search_length);
        let session = StorefrontSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
            cart: CartEngine::new(),
            wishlist: WishlistEngine::new(),
            catalog,
            placement,
        };
        info!(session_id = %session.id, page_size = session.catalog.page_size(), "session started");
        session
    }

    /// A session whose orders go to [`SimulatedOrderPlacement`] with the
    /// configured latency.
    pub fn simulated(config: SessionConfig, search: Arc<dyn ProductSearch>) -> Self {
        let placement = Arc::new(SimulatedOrderPlacement::new(config.order_latency()));
        Self::new(config, search, placement)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cart(&self) -> &CartEngine {
        &self.cart
    }

    pub fn wishlist(&self) -> &WishlistEngine {
        &self.wishlist
    }

    pub fn catalog(&self) -> &CatalogController {
        &self.catalog
    }

    /// Adds one unit of a catalog product to the cart.
    pub fn add_to_cart(&self, product: &ProductSummary) {
        self.cart.add_item(product.to_cart_item());
    }

    /// Adds `quantity` units, as the product page's quantity picker does.
    pub fn add_to_cart_times(&self, product: &ProductSummary, quantity: u32) {
        self.cart.add_item_times(product.to_cart_item(), quantity);
    }

    /// Returns whether the product is now on the wishlist.
    pub fn toggle_wishlist(&self, product: &ProductSummary) -> bool {
        self.wishlist.toggle(product.to_wish_item())
    }

    /// Moves one unit of a saved product into the cart.
    pub fn promote_wish(&self, id: ProductId) -> bool {
        self.wishlist.promote_to_cart(id, &self.cart)
    }

    /// Starts checkout over the session's cart.
    ///
    /// ## Errors
    /// `EmptyCart` when there is nothing to buy.
    pub fn begin_checkout(&self) -> SessionResult<CheckoutWizard> {
        CheckoutWizard::begin(
            self.cart.clone(),
            Arc::clone(&self.placement),
            self.config.pricing(),
        )
    }

    /// Ends the session and reports what it left behind.
    pub fn end(self) -> SessionSummary {
        let summary = SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            cart: self.cart.totals(),
            wishlist_items: self.wishlist.len(),
        };
        info!(
            session_id = %summary.session_id,
            cart_items = summary.cart.total_items,
            cart_total = %summary.cart.total_price,
            wishlist_items = summary.wishlist_items,
            "session ended"
        );
        summary
    }
}
