//! Address commands.

use tracing::info;

use qkart_core::{Address, AddressId};
use qkart_storefront::Result;
use qkart_storefront::state::AppState;

fn log_addresses(addresses: &[Address]) {
    if addresses.is_empty() {
        info!("No addresses found for this account. Add one to proceed.");
    }
    for address in addresses {
        info!("{}  {}", address.id, address.text);
    }
}

/// List saved addresses.
///
/// # Errors
///
/// Returns an error if logged out or the addresses cannot be fetched.
pub async fn list(state: &AppState) -> Result<()> {
    let session = state.session()?;
    let mut book = state.addresses();
    log_addresses(book.refresh(&session).await?);
    Ok(())
}

/// Save a new address.
///
/// # Errors
///
/// Returns an error for blank text, when logged out, or if the backend
/// refuses it.
pub async fn add(state: &AppState, text: &str) -> Result<()> {
    let session = state.session()?;
    let mut book = state.addresses();
    log_addresses(book.add(&session, text).await?);
    Ok(())
}

/// Delete a saved address.
///
/// # Errors
///
/// Returns an error if logged out or the backend refuses it.
pub async fn delete(state: &AppState, id: &AddressId) -> Result<()> {
    let session = state.session()?;
    let mut book = state.addresses();
    log_addresses(book.delete(&session, id).await?);
    Ok(())
}
