//! # Domain Types
//!
//! Core domain types used by every storefront engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ProductSummary  │──►│    CartItem     │   │    WishItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (String)    │◄──│  id (i64)       │       │
//! │  │  slug, name     │   │  name, image    │   │  slug, name     │       │
//! │  │  price, images  │   │  unit_price     │   │  price, image   │       │
//! │  │  category       │   │  quantity ≥ 1   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘            ▲                 │
//! │           │                                            │                 │
//! │           └────────────────────────────────────────────┘                 │
//! │                                                                         │
//! │  Closed sets:  SortKey · ShippingMethod · PaymentMethod                 │
//! │  Checkout:     CheckoutStep · CheckoutField                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Identity Spellings
//! Products are numbered (`i64`) by the catalog, but the cart keys its lines
//! by the string form of that number. Conversions below are the only place
//! the two meet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::PLACEHOLDER_IMAGE;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (1000 bps = 10%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage, e.g. `10.0`.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

// =============================================================================
// Product Summary
// =============================================================================

/// Catalog product identifier.
pub type ProductId = i64;

/// A product record as returned by the product-search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Decimal dollars on the wire (`12.5`).
    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub price: Money,
    #[serde(default)]
    pub images: Vec<String>,
    /// Explicit cover image; falls back to the first of `images`.
    #[serde(default)]
    pub image: Option<String>,
    pub category: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub stock: i64,
}

impl ProductSummary {
    /// The image to show for this product.
    pub fn cover_image(&self) -> &str {
        self.image
            .as_deref()
            .or_else(|| self.images.first().map(String::as_str))
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// The cart line this product becomes when added (quantity 1).
    pub fn to_cart_item(&self) -> CartItem {
        CartItem::new(
            self.id.to_string(),
            self.name.clone(),
            self.price,
            self.cover_image().to_string(),
        )
    }

    /// The wishlist entry for this product.
    pub fn to_wish_item(&self) -> WishItem {
        WishItem {
            id: self.id,
            slug: self.slug.clone(),
            name: self.name.clone(),
            price: self.price,
            image: self.cover_image().to_string(),
        }
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the shopping cart.
///
/// ## Invariants (enforced by the cart engine)
/// - unique by `id`
/// - `quantity >= 1` while the line exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub image: String,
}

impl CartItem {
    /// A fresh line with quantity 1.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        image: impl Into<String>,
    ) -> Self {
        CartItem {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity: 1,
            image: image.into(),
        }
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Wish Item
// =============================================================================

/// A saved-for-later product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WishItem {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub price: Money,
    pub image: String,
}

impl WishItem {
    /// Promotes this entry to a cart line (quantity 1).
    pub fn to_cart_item(&self) -> CartItem {
        CartItem::new(
            self.id.to_string(),
            self.name.clone(),
            self.price,
            self.image.clone(),
        )
    }
}

// =============================================================================
// Sort Key
// =============================================================================

/// Catalog ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SortKey {
    /// Cheapest first.
    #[default]
    #[serde(rename = "price-asc")]
    PriceAsc,
    /// Most expensive first.
    #[serde(rename = "price-desc")]
    PriceDesc,
    /// Best rated first.
    #[serde(rename = "rating")]
    Rating,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::PriceAsc, SortKey::PriceDesc, SortKey::Rating];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::Rating => "rating",
        }
    }

    /// Label for the sort dropdown.
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::PriceAsc => "Price ↑",
            SortKey::PriceDesc => "Price ↓",
            SortKey::Rating => "Best rated",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownChoice {
                kind: "sort key",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Shipping Method
// =============================================================================

/// Delivery speed chosen in the second checkout step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    pub const ALL: [ShippingMethod; 3] = [
        ShippingMethod::Standard,
        ShippingMethod::Express,
        ShippingMethod::Overnight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Express => "express",
            ShippingMethod::Overnight => "overnight",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "Standard Shipping",
            ShippingMethod::Express => "Express Shipping",
            ShippingMethod::Overnight => "Overnight Shipping",
        }
    }

    pub fn delivery_estimate(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "5-7 business days",
            ShippingMethod::Express => "2-3 business days",
            ShippingMethod::Overnight => "Next business day",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShippingMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CoreError::UnknownChoice {
                kind: "shipping method",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer intends to pay. Payment is simulated; no processor is
/// contacted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit/debit card. Card sub-fields become mandatory.
    #[default]
    Card,
    Paypal,
    /// Buy now, pay later.
    Bnpl,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Card, PaymentMethod::Paypal, PaymentMethod::Bnpl];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Bnpl => "bnpl",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit/Debit Card",
            PaymentMethod::Paypal => "PayPal",
            PaymentMethod::Bnpl => "Buy Now, Pay Later",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CoreError::UnknownChoice {
                kind: "payment method",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Checkout Step
// =============================================================================

/// The three editing steps of the checkout wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Address,
    Shipping,
    Payment,
}

impl CheckoutStep {
    /// 1-based position shown in the progress bar.
    pub fn index(&self) -> u8 {
        match self {
            CheckoutStep::Address => 1,
            CheckoutStep::Shipping => 2,
            CheckoutStep::Payment => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CheckoutStep::Address => "Address",
            CheckoutStep::Shipping => "Shipping",
            CheckoutStep::Payment => "Payment",
        }
    }

    /// Next step, capped at `Payment`.
    pub fn next(self) -> Self {
        match self {
            CheckoutStep::Address => CheckoutStep::Shipping,
            CheckoutStep::Shipping | CheckoutStep::Payment => CheckoutStep::Payment,
        }
    }

    /// Previous step, floored at `Address`.
    pub fn previous(self) -> Self {
        match self {
            CheckoutStep::Address | CheckoutStep::Shipping => CheckoutStep::Address,
            CheckoutStep::Payment => CheckoutStep::Shipping,
        }
    }
}

// =============================================================================
// Checkout Field
// =============================================================================

/// Every editable field of the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    PostalCode,
    Country,
    ShippingMethod,
    PaymentMethod,
    CardNumber,
    ExpiryDate,
    Cvv,
    CardholderName,
}

impl CheckoutField {
    pub const ALL: [CheckoutField; 14] = [
        CheckoutField::FirstName,
        CheckoutField::LastName,
        CheckoutField::Email,
        CheckoutField::Phone,
        CheckoutField::Address,
        CheckoutField::City,
        CheckoutField::PostalCode,
        CheckoutField::Country,
        CheckoutField::ShippingMethod,
        CheckoutField::PaymentMethod,
        CheckoutField::CardNumber,
        CheckoutField::ExpiryDate,
        CheckoutField::Cvv,
        CheckoutField::CardholderName,
    ];

    /// Form name, as used by the rendering layer.
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutField::FirstName => "firstName",
            CheckoutField::LastName => "lastName",
            CheckoutField::Email => "email",
            CheckoutField::Phone => "phone",
            CheckoutField::Address => "address",
            CheckoutField::City => "city",
            CheckoutField::PostalCode => "postalCode",
            CheckoutField::Country => "country",
            CheckoutField::ShippingMethod => "shippingMethod",
            CheckoutField::PaymentMethod => "paymentMethod",
            CheckoutField::CardNumber => "cardNumber",
            CheckoutField::ExpiryDate => "expiryDate",
            CheckoutField::Cvv => "cvv",
            CheckoutField::CardholderName => "cardholderName",
        }
    }

    /// Human label, used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            CheckoutField::FirstName => "First name",
            CheckoutField::LastName => "Last name",
            CheckoutField::Email => "Email",
            CheckoutField::Phone => "Phone number",
            CheckoutField::Address => "Address",
            CheckoutField::City => "City",
            CheckoutField::PostalCode => "Postal code",
            CheckoutField::Country => "Country",
            CheckoutField::ShippingMethod => "Shipping method",
            CheckoutField::PaymentMethod => "Payment method",
            CheckoutField::CardNumber => "Card number",
            CheckoutField::ExpiryDate => "Expiry date",
            CheckoutField::Cvv => "CVV",
            CheckoutField::CardholderName => "Cardholder name",
        }
    }

    /// Card sub-fields, mandatory only when paying by card.
    pub fn is_card_detail(&self) -> bool {
        matches!(
            self,
            CheckoutField::CardNumber
                | CheckoutField::ExpiryDate
                | CheckoutField::Cvv
                | CheckoutField::CardholderName
        )
    }
}

impl fmt::Display for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CheckoutField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckoutField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| CoreError::UnknownField(s.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
