//! Authentication service.
//!
//! Login, registration, and logout. Credentials are validated locally first;
//! a form that fails validation never reaches the backend.

use secrecy::SecretString;
use tracing::{info, instrument};

use qkart_core::{LoginCredentials, Registration};

use crate::api::ApiClient;
use crate::error::Result;
use crate::session::{Session, SessionContext};

/// Shown after a successful login.
pub const LOGIN_SUCCESS: &str = "Logged in successfully";

/// Shown after a successful registration.
pub const REGISTER_SUCCESS: &str = "Registration successful";

/// Authentication service.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Log in and persist the new session.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` for an empty username or password (no
    /// request is sent), the backend's error for wrong credentials, or a
    /// storage error if the session cannot be saved.
    #[instrument(skip(self, context, password))]
    pub async fn login<'a>(
        &self,
        context: &'a mut SessionContext,
        username: &str,
        password: SecretString,
    ) -> Result<&'a Session> {
        let credentials = LoginCredentials::parse(username, password)?;
        let response = self.api.login(&credentials).await?;

        let session = context.establish(Session::new(
            SecretString::from(response.token),
            response.username,
            response.balance,
        ))?;
        info!(username = %session.username, "Logged in");
        Ok(session)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the form is invalid (no request is sent),
    /// or the backend's error, e.g. for a taken username.
    #[instrument(skip(self, password, confirm))]
    pub async fn register(
        &self,
        username: &str,
        password: SecretString,
        confirm: &SecretString,
    ) -> Result<()> {
        let registration = Registration::parse(username, password, confirm)?;
        self.api.register(&registration).await?;
        info!(username = %registration.username(), "Registered");
        Ok(())
    }

    /// Log out, clearing the persisted session.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the session cannot be cleared.
    #[allow(clippy::unused_self)]
    pub fn logout(&self, context: &mut SessionContext) -> Result<()> {
        context.teardown()?;
        info!("Logged out");
        Ok(())
    }
}
