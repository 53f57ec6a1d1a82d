//! Saved shipping addresses.

use tracing::instrument;

use qkart_core::{Address, AddressId};

use crate::api::ApiClient;
use crate::error::{AppError, Result};
use crate::session::SessionContext;

const LOGIN_FOR_ADDRESSES: &str = "You must be logged in to manage addresses.";

/// The user's addresses and the one selected for shipping.
#[derive(Debug, Clone)]
pub struct AddressBook {
    api: ApiClient,
    all: Vec<Address>,
    selected: Option<AddressId>,
}

impl AddressBook {
    /// Create an empty address book.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self {
            api,
            all: Vec::new(),
            selected: None,
        }
    }

    /// All saved addresses.
    #[must_use]
    pub fn all(&self) -> &[Address] {
        &self.all
    }

    /// The selected shipping address, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&AddressId> {
        self.selected.as_ref()
    }

    /// Reload the addresses from the backend.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without a session, or the backend's error.
    #[instrument(skip(self, session))]
    pub async fn refresh(&mut self, session: &SessionContext) -> Result<&[Address]> {
        let user = session.require(LOGIN_FOR_ADDRESSES)?;
        let addresses = self.api.addresses(&user.token).await?;
        Ok(self.replace(addresses))
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Empty` for blank text before any request is
    /// sent, `NotLoggedIn` without a session, or the backend's error.
    #[instrument(skip(self, session, text))]
    pub async fn add(&mut self, session: &SessionContext, text: &str) -> Result<&[Address]> {
        let text = Address::validate_text(text)?;
        let user = session.require(LOGIN_FOR_ADDRESSES)?;
        let addresses = self.api.add_address(&user.token, text).await?;
        Ok(self.replace(addresses))
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without a session, or the backend's error.
    #[instrument(skip(self, session), fields(address_id = %id))]
    pub async fn delete(&mut self, session: &SessionContext, id: &AddressId) -> Result<&[Address]> {
        let user = session.require(LOGIN_FOR_ADDRESSES)?;
        let addresses = self.api.delete_address(&user.token, id).await?;
        Ok(self.replace(addresses))
    }

    /// Select the address to ship to.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAddress` if `id` is not a saved address.
    pub fn select(&mut self, id: &AddressId) -> Result<()> {
        if !self.all.iter().any(|address| &address.id == id) {
            return Err(AppError::UnknownAddress(id.clone()));
        }
        self.selected = Some(id.clone());
        Ok(())
    }

    fn replace(&mut self, addresses: Vec<Address>) -> &[Address] {
        self.all = addresses;
        if let Some(selected) = &self.selected
            && !self.all.iter().any(|address| &address.id == selected)
        {
            tracing::debug!(address_id = %selected, "Selected address is gone");
            self.selected = None;
        }
        &self.all
    }
}
