//! Unified error handling for storefront actions.
//!
//! Every action returns `Result<T, AppError>`. An error is terminal to the
//! action that raised it: nothing is retried. [`AppError::kind`] classifies
//! the failure and [`AppError::user_message`] produces the text shown to the
//! user, hiding transport details.

use serde::Serialize;
use thiserror::Error;

use qkart_core::{AddressError, AddressId, CheckoutRejection, CredentialError, InvalidTransition, ProductId};

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::notify::Severity;
use crate::session::SessionError;

/// Message shown for any failure that is not the user's to fix.
pub const BACKEND_UNREACHABLE: &str =
    "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";

/// Broad classification of an `AppError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Client-side field check failed; no request was sent.
    Validation,
    /// The backend rejected the request (4xx).
    HttpClient,
    /// The backend failed or could not be reached.
    HttpServer,
    /// A storefront rule refused the action.
    BusinessRule,
    /// Local storage or configuration failure.
    Internal,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Login or registration form is invalid.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// New address is invalid.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Address is not in the user's address book.
    #[error("Address not found: {0}")]
    UnknownAddress(AddressId),

    /// Product is already in the cart; quantities change through the cart.
    #[error("Item already in cart. Use the cart sidebar to update quantity or remove item.")]
    AlreadyInCart(ProductId),

    /// Product has no line in the cart.
    #[error("Item is not in the cart: {0}")]
    NotInCart(ProductId),

    /// A checkout precondition failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutRejection),

    /// A checkout was driven out of order.
    #[error("Checkout error: {0}")]
    Workflow(#[from] InvalidTransition),

    /// QKart API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session missing or storage failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Credentials(_)
            | Self::Address(_)
            | Self::UnknownAddress(_)
            | Self::Session(SessionError::NotLoggedIn(_)) => ErrorKind::Validation,
            Self::AlreadyInCart(_) | Self::NotInCart(_) | Self::Checkout(_) => {
                ErrorKind::BusinessRule
            }
            Self::Api(ApiError::Client { .. }) => ErrorKind::HttpClient,
            Self::Api(_) => ErrorKind::HttpServer,
            Self::Workflow(_) | Self::Session(_) | Self::Config(_) => ErrorKind::Internal,
        }
    }

    /// How prominently the error should be shown.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::BusinessRule => Severity::Warning,
            ErrorKind::HttpClient | ErrorKind::HttpServer | ErrorKind::Internal => Severity::Error,
        }
    }

    /// Message to show the user.
    ///
    /// Backend rejections keep the backend's own wording. Transport and
    /// server failures collapse to a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Client { message, .. }) => message.clone(),
            Self::Api(_) => BACKEND_UNREACHABLE.to_string(),
            Self::Session(SessionError::NotLoggedIn(reason)) => (*reason).to_string(),
            Self::Session(_) | Self::Config(_) | Self::Workflow(_) => self.to_string(),
            Self::Credentials(err) => err.to_string(),
            Self::Address(err) => err.to_string(),
            Self::Checkout(rejection) => rejection.to_string(),
            Self::UnknownAddress(_) | Self::AlreadyInCart(_) | Self::NotInCart(_) => {
                self.to_string()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors() {
        let err = AppError::from(CredentialError::MissingPassword);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Password is a required field");

        let err = AppError::from(SessionError::NotLoggedIn("Login to add an item to the Cart"));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Login to add an item to the Cart");
    }

    #[test]
    fn test_client_errors_surface_backend_message() {
        let err = AppError::from(ApiError::Client {
            status: 400,
            message: "Password is incorrect".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::HttpClient);
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(err.user_message(), "Password is incorrect");
    }

    #[test]
    fn test_server_errors_are_generic() {
        let err = AppError::from(ApiError::Server {
            status: 500,
            message: "TypeError: cannot read property of undefined".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::HttpServer);
        assert_eq!(err.user_message(), BACKEND_UNREACHABLE);

        let err = AppError::from(ApiError::Parse("expected value".to_string()));
        assert_eq!(err.kind(), ErrorKind::HttpServer);
        assert_eq!(err.user_message(), BACKEND_UNREACHABLE);
    }

    #[test]
    fn test_business_rule_errors() {
        let err = AppError::from(CheckoutRejection::NoAddressSelected);
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(err.user_message(), "Please select one shipping address to proceed");

        let err = AppError::AlreadyInCart(ProductId::new("p1"));
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert_eq!(
            err.user_message(),
            "Item already in cart. Use the cart sidebar to update quantity or remove item."
        );
    }
}
