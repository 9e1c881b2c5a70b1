//! # Order Placement
//!
//! Pricing of a checkout and the collaborator that accepts the order.
//!
//! ## Order Summary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal  = Σ unit_price × quantity          (from the cart)           │
//! │  shipping  = rate of the selected method      standard  $0.00           │
//! │                                               express   $9.99           │
//! │                                               overnight $24.99          │
//! │  tax       = subtotal × tax rate              (10% by default)          │
//! │  total     = subtotal + shipping + tax                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payment is never processed. [`SimulatedOrderPlacement`] waits, logs the
//! payload and hands back an order number.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use storefront_core::{CartItem, Money, ShippingMethod, TaxRate, DEFAULT_TAX_RATE_BPS};

use crate::checkout::CheckoutFields;
use crate::error::PlacementError;

// =============================================================================
// Pricing
// =============================================================================

/// Shipping rates, tax rate and currency symbol used to price a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    pub currency_symbol: String,
    pub tax_rate: TaxRate,
    pub shipping_standard: Money,
    pub shipping_express: Money,
    pub shipping_overnight: Money,
}

impl Default for Pricing {
    fn default() -> Self {
        Pricing {
            currency_symbol: "$".to_string(),
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
            shipping_standard: Money::zero(),
            shipping_express: Money::from_cents(999),
            shipping_overnight: Money::from_cents(2499),
        }
    }
}

impl Pricing {
    pub fn shipping_cost(&self, method: ShippingMethod) -> Money {
        match method {
            ShippingMethod::Standard => self.shipping_standard,
            ShippingMethod::Express => self.shipping_express,
            ShippingMethod::Overnight => self.shipping_overnight,
        }
    }

    pub fn summarize(&self, subtotal: Money, method: ShippingMethod) -> OrderSummary {
        let shipping = self.shipping_cost(method);
        let tax = subtotal.calculate_tax(self.tax_rate);
        OrderSummary {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Formats an amount with the configured symbol.
    pub fn format(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}

/// Price breakdown shown beside the checkout form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

// =============================================================================
// Placement Contract
// =============================================================================

/// Everything the order backend receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<CartItem>,
    pub fields: CheckoutFields,
    pub summary: OrderSummary,
}

/// What the order backend returns for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub total: Money,
}

/// The order backend.
#[async_trait]
pub trait OrderPlacement: Send + Sync {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderConfirmation, PlacementError>;
}

/// Accepts every order after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedOrderPlacement {
    latency: Duration,
}

impl SimulatedOrderPlacement {
    pub fn new(latency: Duration) -> Self {
        SimulatedOrderPlacement { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedOrderPlacement {
    fn default() -> Self {
        SimulatedOrderPlacement::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl OrderPlacement for SimulatedOrderPlacement {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderConfirmation, PlacementError> {
        let payload = serde_json::to_string(request).map_err(|e| PlacementError {
            reason: format!("could not encode order: {}", e),
        })?;
        debug!(bytes = payload.len(), lines = request.items.len(), "submitting order");

        tokio::time::sleep(self.latency).await;

        let confirmation = OrderConfirmation {
            order_id: Uuid::new_v4(),
            placed_at: Utc::now(),
            total: request.summary.total,
        };
        info!(
            order_id = %confirmation.order_id,
            total = %confirmation.total,
            "order accepted"
        );
        Ok(confirmation)
    }
}
