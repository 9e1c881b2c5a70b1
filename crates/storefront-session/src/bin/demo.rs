//! Scripted walk through one shopper session against an in-memory catalog.
//!
//! ```text
//! cargo run -p storefront-session --bin session-demo
//! STOREFRONT_ORDER_LATENCY_MS=0 RUST_LOG=debug cargo run --bin session-demo
//! ```

use std::sync::Arc;

use storefront_core::{Money, ProductSummary, ShippingMethod, SortKey};
use storefront_session::{
    init_tracing, Cart, FilterPatch, InMemoryProductSearch, Observable, SessionConfig, SessionResult,
    StorefrontSession, SubmitOutcome,
};
use tracing::info;

fn sample_catalog() -> Vec<ProductSummary> {
    let rows = [
        (1, "Brass Desk Lamp", "lighting", 4900, 4.6),
        (2, "Linen Throw", "textiles", 3500, 4.2),
        (3, "Oak Side Table", "furniture", 18900, 4.8),
        (4, "Paper Pendant", "lighting", 6200, 3.9),
        (5, "Wool Rug", "textiles", 24000, 4.4),
        (6, "Walnut Shelf", "furniture", 9900, 4.1),
    ];

    rows.into_iter()
        .map(|(id, name, category, cents, rating)| ProductSummary {
            id,
            slug: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            description: format!("{} for the living room", category),
            price: Money::from_cents(cents),
            images: Vec::new(),
            image: None,
            category: category.to_string(),
            rating,
            review_count: 12,
            stock: 20,
        })
        .collect()
}

#[tokio::main]
async fn main() -> SessionResult<()> {
    init_tracing();

    let config = SessionConfig::load_or_default(None);
    let search = Arc::new(InMemoryProductSearch::new(sample_catalog()));
    let session = StorefrontSession::simulated(config, search);

    session.cart().on_change(Arc::new(|cart: &Cart| {
        info!(lines = cart.items.len(), total = %cart.total_price(), "cart changed");
    }));

    let catalog = session.catalog();
    catalog.refresh().await?;
    info!(label = %catalog.snapshot().showing_label(), categories = ?catalog.categories(), "catalog loaded");

    catalog
        .set_filter(FilterPatch::new().category("lighting").sort(SortKey::PriceDesc))
        .await?;
    for product in catalog.items() {
        info!(id = product.id, name = %product.name, price = %product.price, "lighting");
    }

    if let Some(lamp) = catalog.product(1) {
        session.add_to_cart_times(&lamp, 2);
        session.toggle_wishlist(&lamp);
    }

    catalog.clear_filters().await?;
    if let Some(rug) = catalog.product(5) {
        session.toggle_wishlist(&rug);
    }
    session.promote_wish(5);

    let wizard = session.begin_checkout()?;
    for (name, value) in [
        ("firstName", "Grace"),
        ("lastName", "Hopper"),
        ("email", "grace@example.com"),
        ("phone", "2025550143"),
        ("address", "1 Compiler Way"),
        ("city", "Arlington"),
        ("postalCode", "22201"),
        ("country", "US"),
        ("cardNumber", "4242424242424242"),
        ("expiryDate", "09/29"),
        ("cvv", "314"),
        ("cardholderName", "Grace Hopper"),
    ] {
        wizard.update_field(name, value)?;
    }
    wizard.next();
    wizard.select_shipping(ShippingMethod::Express);
    wizard.next();

    let summary = wizard.order_summary();
    let pricing = wizard.pricing();
    info!(
        subtotal = %pricing.format(summary.subtotal),
        shipping = %pricing.format(summary.shipping),
        tax = %pricing.format(summary.tax),
        total = %pricing.format(summary.total),
        "order summary"
    );

    if let SubmitOutcome::Placed(confirmation) = wizard.submit().await? {
        info!(order_id = %confirmation.order_id, placed_at = %confirmation.placed_at, "thank you for your order");
    }

    let summary = session.end();
    info!(
        wishlist_items = summary.wishlist_items,
        cart_items = summary.cart.total_items,
        "done"
    );
    Ok(())
}
