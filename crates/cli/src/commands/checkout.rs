//! Checkout command.

use tracing::info;

use qkart_core::{AddressId, CheckoutRejection};
use qkart_storefront::{AppError, Result};
use qkart_storefront::notify::{Notification, Notifier};
use qkart_storefront::services::checkout::{LOGIN_FOR_CHECKOUT, ORDER_PLACED};
use qkart_storefront::state::AppState;

use super::log_cart;

/// Place an order for the current cart.
///
/// Without `address` no shipping address is selected, so the order is
/// refused at the selection check. An `address` that is not saved is
/// refused at the same point.
///
/// # Errors
///
/// Returns an error if logged out, if a checkout check fails, or if the
/// backend refuses the order.
pub async fn place_order(
    state: &AppState,
    notifier: &dyn Notifier,
    address: Option<AddressId>,
) -> Result<()> {
    let mut session = state.session()?;
    session.require(LOGIN_FOR_CHECKOUT)?;

    let mut cart = state.cart();
    cart.fetch(&session).await?;
    let mut addresses = state.addresses();
    addresses.refresh(&session).await?;
    // An unknown id is reported only where the selection check would fail,
    // after the balance and address-list checks.
    let unknown = address.as_ref().and_then(|id| addresses.select(id).err());

    log_cart(cart.items());
    let mut checkout = state.checkout();
    let remaining = match (
        checkout
            .place_order(&mut session, cart.items(), &addresses)
            .await,
        unknown,
    ) {
        (Err(AppError::Checkout(CheckoutRejection::NoAddressSelected)), Some(err)) => {
            return Err(err);
        }
        (result, _) => result?,
    };

    notifier.notify(Notification::success(ORDER_PLACED));
    info!("Remaining wallet balance: {remaining}");
    Ok(())
}
