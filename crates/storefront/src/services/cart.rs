//! Cart fetch and mutation.
//!
//! The backend owns the cart. Every mutation sends an absolute quantity and
//! the returned entry list is merged against the catalog to rebuild the
//! displayed items.

use tracing::{debug, instrument};

use qkart_core::{CartEntry, CartItem, Price, ProductId, cart_total, merge};

use super::catalog::CatalogService;
use crate::api::ApiClient;
use crate::error::{AppError, Result};
use crate::session::SessionContext;

/// Shown when a logged-out user tries to add to the cart.
pub const LOGIN_TO_ADD: &str = "Login to add an item to the Cart";

/// Shown when a logged-out user tries to view or change the cart.
pub const LOGIN_TO_VIEW: &str = "Login to view the Cart";

/// The user's cart.
#[derive(Debug, Clone)]
pub struct CartService {
    api: ApiClient,
    catalog: CatalogService,
    items: Vec<CartItem>,
}

impl CartService {
    /// Create an empty cart.
    #[must_use]
    pub const fn new(api: ApiClient, catalog: CatalogService) -> Self {
        Self {
            api,
            catalog,
            items: Vec::new(),
        }
    }

    /// Items currently in the cart.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of `cost * quantity` over the cart.
    #[must_use]
    pub fn total(&self) -> Price {
        cart_total(&self.items)
    }

    /// Load the cart from the backend.
    ///
    /// A logged-out user has an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart or the catalog cannot be fetched.
    #[instrument(skip(self, session))]
    pub async fn fetch(&mut self, session: &SessionContext) -> Result<&[CartItem]> {
        let Some(token) = session.token() else {
            self.items.clear();
            return Ok(&self.items);
        };

        let entries = self.api.cart(token).await?;
        self.apply(&entries).await?;
        Ok(&self.items)
    }

    /// Add a product with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without a session and `AlreadyInCart` if the
    /// product already has a line, both before any request is sent.
    #[instrument(skip(self, session), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &mut self,
        session: &SessionContext,
        product_id: &ProductId,
    ) -> Result<&[CartItem]> {
        session.require(LOGIN_TO_ADD)?;
        if qkart_core::cart::contains_product(&self.items, product_id) {
            return Err(AppError::AlreadyInCart(product_id.clone()));
        }
        self.send(session, product_id, 1).await
    }

    /// Set the quantity of a product. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without a session, or the backend's error.
    #[instrument(skip(self, session), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &mut self,
        session: &SessionContext,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<&[CartItem]> {
        self.send(session, product_id, quantity).await
    }

    /// Raise a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns `NotInCart` if the product has no line.
    pub async fn increment(
        &mut self,
        session: &SessionContext,
        product_id: &ProductId,
    ) -> Result<&[CartItem]> {
        let quantity = self.current_quantity(product_id)?;
        self.set_quantity(session, product_id, quantity.saturating_add(1))
            .await
    }

    /// Lower a line's quantity by one. A line at 1 is removed.
    ///
    /// # Errors
    ///
    /// Returns `NotInCart` if the product has no line.
    pub async fn decrement(
        &mut self,
        session: &SessionContext,
        product_id: &ProductId,
    ) -> Result<&[CartItem]> {
        let quantity = self.current_quantity(product_id)?;
        self.set_quantity(session, product_id, quantity.saturating_sub(1))
            .await
    }

    fn current_quantity(&self, product_id: &ProductId) -> Result<u32> {
        match qkart_core::cart::quantity_of(&self.items, product_id) {
            0 => Err(AppError::NotInCart(product_id.clone())),
            quantity => Ok(quantity),
        }
    }

    async fn send(
        &mut self,
        session: &SessionContext,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<&[CartItem]> {
        let token = &session.require(LOGIN_TO_VIEW)?.token;
        let entries = self.api.update_cart(token, product_id, quantity).await?;
        self.apply(&entries).await?;
        Ok(&self.items)
    }

    async fn apply(&mut self, entries: &[CartEntry]) -> Result<()> {
        let products = self.catalog.products().await?;
        self.items = merge(entries, &products);
        debug!(
            entries = entries.len(),
            items = self.items.len(),
            "Cart merged"
        );
        Ok(())
    }
}
