//! Checkout preconditions and the order placement workflow.
//!
//! Placing an order moves through an explicit state machine:
//!
//! ```text
//! Idle -> Validating -> Submitting -> Succeeded
//!             |              |
//!             +--> Failed <--+
//! ```
//!
//! Every transition is a pure function of the current state and the event
//! that drives it. The storefront's checkout service performs the network
//! call between `Submitting` and the terminal states.

use serde::Serialize;

use crate::cart::{CartItem, cart_total};
use crate::types::{Address, AddressId, Price};

/// Shipping charge added to every order.
pub const SHIPPING: Price = Price::ZERO;

/// A checkout precondition that failed.
///
/// Preconditions are checked in declaration order and the first failure is
/// reported. The display strings are shown to the user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CheckoutRejection {
    /// The wallet balance does not cover the cart total.
    #[error("You do not have enough balance in your wallet for this purchase")]
    InsufficientBalance {
        /// Wallet balance at validation time.
        balance: Price,
        /// Cart total at validation time.
        total: Price,
    },
    /// The user has no saved addresses.
    #[error("Please add a new address before proceeding")]
    NoAddresses,
    /// The user has addresses but none is selected.
    #[error("Please select one shipping address to proceed")]
    NoAddressSelected,
}

/// Everything needed to decide whether an order may be placed.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRequest<'a> {
    /// Wallet balance cached in the session.
    pub balance: Price,
    /// Cart lines being purchased.
    pub items: &'a [CartItem],
    /// Saved addresses.
    pub addresses: &'a [Address],
    /// The address chosen for this order, if any.
    pub selected_address: Option<&'a AddressId>,
}

/// An order that passed every precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedOrder {
    /// Shipping address for the order.
    pub address_id: AddressId,
    /// Amount the wallet will be charged.
    pub total: Price,
}

impl CheckoutRequest<'_> {
    /// Cart total for this request, shipping included.
    #[must_use]
    pub fn total(&self) -> Price {
        cart_total(self.items) + SHIPPING
    }

    /// Check the preconditions in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first `CheckoutRejection` that applies.
    pub fn validate(&self) -> Result<ValidatedOrder, CheckoutRejection> {
        let total = self.total();
        if self.balance < total {
            return Err(CheckoutRejection::InsufficientBalance {
                balance: self.balance,
                total,
            });
        }

        if self.addresses.is_empty() {
            return Err(CheckoutRejection::NoAddresses);
        }

        let address_id = self
            .selected_address
            .ok_or(CheckoutRejection::NoAddressSelected)?;

        Ok(ValidatedOrder {
            address_id: address_id.clone(),
            total,
        })
    }
}

/// Why a checkout ended in the `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutFailure {
    /// A precondition failed; no request was sent.
    Rejected(CheckoutRejection),
    /// The backend refused or could not process the order.
    Backend {
        /// Message to show the user.
        message: String,
    },
}

/// State of a single checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Preconditions are being checked.
    Validating,
    /// The order request is in flight.
    Submitting(ValidatedOrder),
    /// The backend accepted the order.
    Succeeded {
        /// The order that was placed.
        order: ValidatedOrder,
        /// Wallet balance after the charge.
        remaining_balance: Price,
    },
    /// The attempt ended without an order.
    Failed(CheckoutFailure),
}

/// A transition was requested from a state that does not accept it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {event} while checkout is {from}")]
pub struct InvalidTransition {
    /// Name of the current state.
    pub from: &'static str,
    /// Name of the rejected event.
    pub event: &'static str,
}

impl CheckoutState {
    /// Short name of the state, used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting(_) => "submitting",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the attempt has finished.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed(_))
    }

    /// Start a checkout attempt.
    ///
    /// Accepted from `Idle` and from either terminal state, so a failed or
    /// completed attempt can be retried.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while an attempt is validating or submitting.
    pub fn start(&self) -> Result<Self, InvalidTransition> {
        match self {
            Self::Idle | Self::Succeeded { .. } | Self::Failed(_) => Ok(Self::Validating),
            _ => Err(self.invalid("start")),
        }
    }

    /// Apply the precondition check.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the state is `Validating`.
    pub fn validate(&self, request: &CheckoutRequest<'_>) -> Result<Self, InvalidTransition> {
        match self {
            Self::Validating => Ok(match request.validate() {
                Ok(order) => Self::Submitting(order),
                Err(rejection) => Self::Failed(CheckoutFailure::Rejected(rejection)),
            }),
            _ => Err(self.invalid("validate")),
        }
    }

    /// Record the backend's acceptance of the order.
    ///
    /// The remaining balance is the pre-checkout balance minus the order total.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the state is `Submitting`.
    pub fn succeed(&self, balance_before: Price) -> Result<Self, InvalidTransition> {
        match self {
            Self::Submitting(order) => Ok(Self::Succeeded {
                order: order.clone(),
                remaining_balance: balance_before - order.total,
            }),
            _ => Err(self.invalid("succeed")),
        }
    }

    /// Record that the backend did not place the order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the state is `Submitting`.
    pub fn fail(&self, message: impl Into<String>) -> Result<Self, InvalidTransition> {
        match self {
            Self::Submitting(_) => Ok(Self::Failed(CheckoutFailure::Backend {
                message: message.into(),
            })),
            _ => Err(self.invalid("fail")),
        }
    }

    const fn invalid(&self, event: &'static str) -> InvalidTransition {
        InvalidTransition {
            from: self.name(),
            event,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartEntry, merge};
    use crate::types::{Product, ProductId};

    fn items(cost: i64, quantity: u32) -> Vec<CartItem> {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Basketball".to_string(),
            category: "Sports".to_string(),
            cost: Price::from_units(cost),
            rating: 5,
            image: String::new(),
        };
        merge(&[CartEntry::new("p1", quantity)], &[product])
    }

    fn addresses() -> Vec<Address> {
        vec![Address {
            id: AddressId::new("a1"),
            text: "42 Main Street".to_string(),
        }]
    }

    #[test]
    fn test_insufficient_balance_wins_over_address_checks() {
        let items = items(50, 2);
        let selected = AddressId::new("a1");
        let with_addresses = addresses();

        for (addresses, selected) in [
            (&[][..], None),
            (&with_addresses[..], None),
            (&with_addresses[..], Some(&selected)),
        ] {
            let request = CheckoutRequest {
                balance: Price::from_units(99),
                items: &items,
                addresses,
                selected_address: selected,
            };
            assert!(matches!(
                request.validate(),
                Err(CheckoutRejection::InsufficientBalance { .. })
            ));
        }
    }

    #[test]
    fn test_no_addresses_rejected_with_sufficient_balance() {
        let items = items(50, 2);
        let request = CheckoutRequest {
            balance: Price::from_units(5000),
            items: &items,
            addresses: &[],
            selected_address: None,
        };
        assert_eq!(request.validate(), Err(CheckoutRejection::NoAddresses));
    }

    #[test]
    fn test_unselected_address_rejected() {
        let items = items(50, 2);
        let addresses = addresses();
        let request = CheckoutRequest {
            balance: Price::from_units(100),
            items: &items,
            addresses: &addresses,
            selected_address: None,
        };
        assert_eq!(request.validate(), Err(CheckoutRejection::NoAddressSelected));
    }

    #[test]
    fn test_exact_balance_is_enough() {
        let items = items(50, 2);
        let addresses = addresses();
        let selected = AddressId::new("a1");
        let request = CheckoutRequest {
            balance: Price::from_units(100),
            items: &items,
            addresses: &addresses,
            selected_address: Some(&selected),
        };

        let order = request.validate().unwrap();
        assert_eq!(order.total, Price::from_units(100));
        assert_eq!(order.address_id, selected);
    }

    #[test]
    fn test_workflow_happy_path() {
        let items = items(50, 2);
        let addresses = addresses();
        let selected = AddressId::new("a1");
        let request = CheckoutRequest {
            balance: Price::from_units(5000),
            items: &items,
            addresses: &addresses,
            selected_address: Some(&selected),
        };

        let state = CheckoutState::Idle.start().unwrap();
        assert_eq!(state, CheckoutState::Validating);

        let state = state.validate(&request).unwrap();
        assert_eq!(state.name(), "submitting");

        let state = state.succeed(request.balance).unwrap();
        assert!(state.is_terminal());
        match state {
            CheckoutState::Succeeded {
                remaining_balance, ..
            } => assert_eq!(remaining_balance, Price::from_units(4900)),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_workflow_rejection_skips_submitting() {
        let items = items(50, 2);
        let request = CheckoutRequest {
            balance: Price::ZERO,
            items: &items,
            addresses: &[],
            selected_address: None,
        };

        let state = CheckoutState::Validating.validate(&request).unwrap();
        assert!(matches!(
            state,
            CheckoutState::Failed(CheckoutFailure::Rejected(
                CheckoutRejection::InsufficientBalance { .. }
            ))
        ));
        // A failed attempt can be retried.
        assert_eq!(state.start().unwrap(), CheckoutState::Validating);
    }

    #[test]
    fn test_workflow_backend_failure() {
        let order = ValidatedOrder {
            address_id: AddressId::new("a1"),
            total: Price::from_units(10),
        };
        let state = CheckoutState::Submitting(order).fail("Wallet balance not sufficient").unwrap();
        assert_eq!(
            state,
            CheckoutState::Failed(CheckoutFailure::Backend {
                message: "Wallet balance not sufficient".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_transitions() {
        let err = CheckoutState::Validating.start().unwrap_err();
        assert_eq!(err.to_string(), "cannot start while checkout is validating");

        assert!(CheckoutState::Idle.succeed(Price::ZERO).is_err());
        assert!(CheckoutState::Idle.fail("nope").is_err());

        let request = CheckoutRequest {
            balance: Price::ZERO,
            items: &[],
            addresses: &[],
            selected_address: None,
        };
        assert!(CheckoutState::Idle.validate(&request).is_err());
    }
}
