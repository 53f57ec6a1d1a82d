//! Cart commands.
//!
//! The cart lives on the backend, so each command fetches it first. That
//! keeps the duplicate-add check and the +/- steps working from the
//! current quantities.

use qkart_core::ProductId;
use qkart_storefront::Result;
use qkart_storefront::services::CartService;
use qkart_storefront::session::SessionContext;
use qkart_storefront::state::AppState;

use super::log_cart;

async fn load(state: &AppState) -> Result<(SessionContext, CartService)> {
    let session = state.session()?;
    let mut cart = state.cart();
    cart.fetch(&session).await?;
    Ok((session, cart))
}

/// Show the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be fetched.
pub async fn show(state: &AppState) -> Result<()> {
    let (_, cart) = load(state).await?;
    log_cart(cart.items());
    Ok(())
}

/// Add a product with quantity 1.
///
/// # Errors
///
/// Returns an error if logged out, if the product is already in the cart,
/// or if the backend refuses it.
pub async fn add(state: &AppState, product_id: &ProductId) -> Result<()> {
    let (session, mut cart) = load(state).await?;
    log_cart(cart.add_to_cart(&session, product_id).await?);
    Ok(())
}

/// Set a product's quantity.
///
/// # Errors
///
/// Returns an error if logged out or if the backend refuses it.
pub async fn set(state: &AppState, product_id: &ProductId, quantity: u32) -> Result<()> {
    let (session, mut cart) = load(state).await?;
    log_cart(cart.set_quantity(&session, product_id, quantity).await?);
    Ok(())
}

/// Raise a product's quantity by one.
///
/// # Errors
///
/// Returns an error if the product is not in the cart.
pub async fn increment(state: &AppState, product_id: &ProductId) -> Result<()> {
    let (session, mut cart) = load(state).await?;
    log_cart(cart.increment(&session, product_id).await?);
    Ok(())
}

/// Lower a product's quantity by one.
///
/// # Errors
///
/// Returns an error if the product is not in the cart.
pub async fn decrement(state: &AppState, product_id: &ProductId) -> Result<()> {
    let (session, mut cart) = load(state).await?;
    log_cart(cart.decrement(&session, product_id).await?);
    Ok(())
}
