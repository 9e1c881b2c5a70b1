//! # storefront-core: Pure Domain Logic for the Storefront
//!
//! Types and rules shared by the session engines, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Session Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Presentation layer (any technology)              │   │
//! │  │    Catalog grid ──► Cart drawer ──► Wishlist ──► Checkout       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ subscribe / operations                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  storefront-session (engines)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   money   │  │ validation│                  │   │
//! │  │   │ CartItem  │  │   Money   │  │  checkout │                  │   │
//! │  │   │ WishItem  │  │  TaxRate  │  │   rules   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO ASYNC • NO GLOBAL STATE                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Items, products and the closed sets the UI selects from
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Checkout and search field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::{CartItem, Money};
//!
//! let mut line = CartItem::new("1", "Desk Lamp", Money::from_cents(1000), "/lamp.jpg");
//! line.quantity = 2;
//! assert_eq!(line.line_total().to_string(), "$20.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Catalog page size used by the storefront's product grid.
pub const DEFAULT_PAGE_SIZE: u32 = 52;

/// Largest `limit` the product-search endpoint honours.
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Search terms are cut to this many characters.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Image used when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Tax applied to the order subtotal by default (1000 bps = 10%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;
