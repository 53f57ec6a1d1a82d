//! CLI command implementations.
//!
//! Every command loads what it needs, calls the storefront services, and
//! writes its output through `tracing` at info level.

pub mod account;
pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;

use qkart_core::{CartItem, Product};

fn log_product(product: &Product) {
    tracing::info!(
        "{id}  {name}  [{category}]  {cost}  rating {rating}/5",
        id = product.id,
        name = product.name,
        category = product.category,
        cost = product.cost,
        rating = product.rating,
    );
}

fn log_cart(items: &[CartItem]) {
    if items.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }
    for item in items {
        tracing::info!(
            "{id}  {name}  {cost} x {quantity} = {subtotal}",
            id = item.product.id,
            name = item.product.name,
            cost = item.product.cost,
            quantity = item.quantity,
            subtotal = item.subtotal(),
        );
    }
    tracing::info!("Total: {}", qkart_core::cart_total(items));
}
