//! # storefront-session: Shopper Session Engines
//!
//! The reactive state behind a storefront: cart, wishlist, catalog browsing
//! and the checkout wizard.
//!
//! ## Engine Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Session Engines                                     │
//! │                                                                         │
//! │  Presentation layer ── subscribe (Observable::on_change) ──┐            │
//! │        │ operations                                        │            │
//! │        ▼                                                   │            │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────────┴──┐         │
//! │  │ CartEngine   │◄──│ Wishlist     │   │ CatalogController    │         │
//! │  │ lines, qty,  │   │ Engine       │   │ query, pages,        │─► search│
//! │  │ totals       │   │ saved items  │   │ stale-response guard │         │
//! │  └──────▲───────┘   └──────────────┘   └──────────────────────┘         │
//! │         │ items / clear                                                 │
//! │  ┌──────┴───────────┐                                                   │
//! │  │ CheckoutWizard   │──────────────────────────────────────► order      │
//! │  │ steps, fields,   │                                        placement  │
//! │  │ validation       │                                                   │
//! │  └──────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - Cart lines and totals
//! - [`wishlist`] - Saved products
//! - [`catalog`] - Filtered, paginated product browsing
//! - [`checkout`] - Three-step order entry
//! - [`search`] / [`order`] - The two external collaborators
//! - [`observer`] - Change notification shared by every engine
//! - [`config`] - `storefront.toml` and environment overrides
//! - [`session`] - Creates and owns all of the above

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod observer;
pub mod order;
pub mod search;
pub mod session;
pub mod wishlist;

pub use cart::{Cart, CartEngine, CartTotals};
pub use catalog::{
    CatalogController, CatalogQuery, CatalogSnapshot, FetchOutcome, FilterPatch, SkipReason,
};
pub use checkout::{CheckoutFields, CheckoutPhase, CheckoutState, CheckoutWizard, SubmitOutcome};
pub use config::SessionConfig;
pub use error::{ConfigError, PlacementError, SearchError, SessionError, SessionResult};
pub use observer::{Listener, Observable, SubscriptionId};
pub use order::{
    OrderConfirmation, OrderPlacement, OrderRequest, OrderSummary, Pricing,
    SimulatedOrderPlacement,
};
pub use search::{InMemoryProductSearch, ProductSearch, SearchPage, SearchRequest};
pub use session::{SessionSummary, StorefrontSession};
pub use wishlist::{Wishlist, WishlistEngine};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront_session=trace` - Trace the engines only
/// - Default: `info,storefront=debug`
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
