//! QKart REST API client.
//!
//! # Architecture
//!
//! - JSON over HTTPS via `reqwest`
//! - Authenticated endpoints take the session's bearer token explicitly; the
//!   client itself holds no user state
//! - Non-success responses are classified by status class: 4xx keeps the
//!   backend's message verbatim, 5xx is reported as a server failure
//!
//! # Endpoints
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/products` | |
//! | GET | `/products/search?value=<q>` | |
//! | GET/POST | `/cart` | bearer |
//! | POST | `/cart/checkout` | bearer |
//! | GET/POST | `/user/addresses` | bearer |
//! | DELETE | `/user/addresses/:id` | bearer |
//! | POST | `/auth/login`, `/auth/register` | |

mod types;

pub use types::{LoginResponse, StatusResponse};

use std::sync::Arc;

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use qkart_core::{
    Address, AddressId, CartEntry, LoginCredentials, Product, ProductId, Registration,
};

use crate::config::StorefrontConfig;
use types::{
    AddressRequest, CartUpdateRequest, CheckoutRequestBody, CredentialsRequest,
};

/// Longest slice of a response body included in logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when calling the QKart API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request (4xx).
    #[error("API error: {status} - {message}")]
    Client { status: u16, message: String },

    /// The backend failed to process the request (5xx).
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Whether this is a 404 from the backend.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Client { status: 404, .. })
    }
}

/// Client for the QKart REST API.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base().to_string(),
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and decode a JSON response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

            tracing::warn!(
                status = %status,
                body = %truncate(&body),
                "QKart API returned non-success status"
            );

            return Err(if status.is_server_error() {
                ApiError::Server {
                    status: status.as_u16(),
                    message,
                }
            } else {
                ApiError::Client {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse QKart API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send a request whose success body is a `{success, message}` envelope.
    async fn send_ack(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let ack: StatusResponse = self.send(request).await?;
        if ack.success {
            Ok(())
        } else {
            Err(ApiError::Client {
                status: 200,
                message: ack.message.unwrap_or_else(|| "Request was not successful".to_string()),
            })
        }
    }

    fn authed(&self, request: RequestBuilder, token: &SecretString) -> RequestBuilder {
        request.bearer_auth(token.expose_secret())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch the full product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let products: Vec<Product> = self
            .send(self.inner.client.get(self.url("/products")))
            .await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Search the catalog by name or category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` with status 404 when nothing matches.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("/products/search"))
            .query(&[("value", query)]);
        self.send(request).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the user's cart entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &SecretString) -> Result<Vec<CartEntry>, ApiError> {
        let request = self.authed(self.inner.client.get(self.url("/cart")), token);
        self.send(request).await
    }

    /// Set the quantity of a product in the cart. Zero removes the product.
    ///
    /// Returns the backend's updated entry list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it
    /// (e.g., 404 for an unknown product).
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn update_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, ApiError> {
        let body = CartUpdateRequest {
            product_id,
            qty: quantity,
        };
        let request = self.authed(self.inner.client.post(self.url("/cart")), token).json(&body);
        self.send(request).await
    }

    /// Place an order for the current cart, shipped to `address_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses the order.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn checkout(&self, token: &SecretString, address_id: &AddressId) -> Result<(), ApiError> {
        let body = CheckoutRequestBody { address_id };
        let request = self
            .authed(self.inner.client.post(self.url("/cart/checkout")), token)
            .json(&body);
        self.send_ack(request).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch the user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn addresses(&self, token: &SecretString) -> Result<Vec<Address>, ApiError> {
        let request = self.authed(self.inner.client.get(self.url("/user/addresses")), token);
        self.send(request).await
    }

    /// Save a new address. Returns the updated address list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token, text))]
    pub async fn add_address(&self, token: &SecretString, text: &str) -> Result<Vec<Address>, ApiError> {
        let request = self
            .authed(self.inner.client.post(self.url("/user/addresses")), token)
            .json(&AddressRequest { address: text });
        self.send(request).await
    }

    /// Delete a saved address. Returns the updated address list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn delete_address(
        &self,
        token: &SecretString,
        address_id: &AddressId,
    ) -> Result<Vec<Address>, ApiError> {
        let path = format!("/user/addresses/{address_id}");
        let request = self.authed(self.inner.client.delete(self.url(&path)), token);
        self.send(request).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` for wrong credentials.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        let body = CredentialsRequest {
            username: credentials.username(),
            password: credentials.password().expose_secret(),
        };
        let response: LoginResponse = self
            .send(self.inner.client.post(self.url("/auth/login")).json(&body))
            .await?;

        if !response.success {
            return Err(ApiError::Client {
                status: 200,
                message: "Login was not successful".to_string(),
            });
        }
        Ok(response)
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` if the username is taken.
    #[instrument(skip(self, registration), fields(username = %registration.username()))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let body = CredentialsRequest {
            username: registration.username(),
            password: registration.password().expose_secret(),
        };
        self.send_ack(self.inner.client.post(self.url("/auth/register")).json(&body))
            .await
    }
}

/// Extract the `message` field from a backend error payload.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<StatusResponse>(body)
        .ok()
        .and_then(|r| r.message)
        .filter(|m| !m.is_empty())
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}
