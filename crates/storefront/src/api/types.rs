//! Request and response payloads for the QKart REST API.
//!
//! Domain records (`Product`, `CartEntry`, `Address`) come straight from
//! `qkart-core`; this module only holds the envelopes around them.

use serde::{Deserialize, Serialize};

use qkart_core::{AddressId, Price, ProductId};

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Serialize)]
pub(crate) struct CredentialsRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful `POST /auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Whether the backend accepted the credentials.
    pub success: bool,
    /// Bearer token for authenticated calls.
    pub token: String,
    /// Canonical username.
    pub username: String,
    /// Wallet balance.
    pub balance: Price,
}

/// Body of `POST /cart`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartUpdateRequest<'a> {
    pub product_id: &'a ProductId,
    pub qty: u32,
}

/// Body of `POST /user/addresses`.
#[derive(Serialize)]
pub(crate) struct AddressRequest<'a> {
    pub address: &'a str,
}

/// Body of `POST /cart/checkout`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckoutRequestBody<'a> {
    pub address_id: &'a AddressId,
}

/// Generic `{success, message}` envelope used for acknowledgements and errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    /// Whether the operation succeeded.
    #[serde(default)]
    pub success: bool,
    /// Human-readable reason, present on failures.
    #[serde(default)]
    pub message: Option<String>,
}
