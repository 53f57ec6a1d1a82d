//! Order placement.
//!
//! Drives one [`CheckoutState`] attempt at a time: validate locally, submit,
//! then debit the cached wallet balance. The debit is optimistic; the
//! backend's balance is not re-read. An attempt whose future was dropped
//! mid-request is discarded when the next one starts.

use tracing::{info, instrument, warn};

use qkart_core::{CartItem, CheckoutFailure, CheckoutRequest, CheckoutState, Price};

use super::address::AddressBook;
use crate::api::ApiClient;
use crate::error::{AppError, Result};
use crate::session::SessionContext;

/// Shown when checkout is attempted without a session.
pub const LOGIN_FOR_CHECKOUT: &str = "You must be logged in to access checkout page.";

/// Shown after an order is placed.
pub const ORDER_PLACED: &str = "Order placed successfully!";

/// Places orders and tracks the state of the latest attempt.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    api: ApiClient,
    state: CheckoutState,
}

impl CheckoutService {
    /// Create a checkout service with no attempt in progress.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: CheckoutState::default(),
        }
    }

    /// State of the latest attempt.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Place an order for `items`, shipped to the address selected in
    /// `addresses`.
    ///
    /// Returns the remaining wallet balance, which has also been persisted
    /// to the session.
    ///
    /// # Errors
    ///
    /// - `NotLoggedIn` without a session
    /// - `CheckoutRejection` if balance or address checks fail; no request
    ///   is sent
    /// - the backend's error if it refuses the order
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn place_order(
        &mut self,
        session: &mut SessionContext,
        items: &[CartItem],
        addresses: &AddressBook,
    ) -> Result<Price> {
        let (token, balance) = {
            let current = session.require(LOGIN_FOR_CHECKOUT)?;
            (current.token.clone(), current.balance)
        };

        // Holding `&mut self` means no other attempt is running, so a
        // non-terminal state is left over from a dropped future.
        if matches!(
            self.state,
            CheckoutState::Validating | CheckoutState::Submitting(_)
        ) {
            warn!(state = self.state.name(), "Discarding interrupted checkout");
            self.state = CheckoutState::Idle;
        }

        self.state = self.state.start()?;
        let request = CheckoutRequest {
            balance,
            items,
            addresses: addresses.all(),
            selected_address: addresses.selected(),
        };
        self.state = self.state.validate(&request)?;

        let order = match &self.state {
            CheckoutState::Submitting(order) => order.clone(),
            CheckoutState::Failed(CheckoutFailure::Rejected(rejection)) => {
                warn!(reason = %rejection, "Checkout refused");
                return Err(rejection.clone().into());
            }
            other => {
                return Err(AppError::Workflow(qkart_core::InvalidTransition {
                    from: other.name(),
                    event: "submit",
                }));
            }
        };

        if let Err(e) = self.api.checkout(&token, &order.address_id).await {
            let err = AppError::from(e);
            self.state = self.state.fail(err.user_message())?;
            return Err(err);
        }

        self.state = self.state.succeed(balance)?;
        let remaining = balance - order.total;
        session.set_balance(remaining)?;

        info!(
            total = %order.total,
            remaining = %remaining,
            address_id = %order.address_id,
            "Order placed"
        );
        Ok(remaining)
    }
}
