//! Login and registration credentials.
//!
//! Both forms are validated client-side before any request is issued, so a
//! rejected form never reaches the network.

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when validating credentials.
///
/// The display strings are shown to the user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The username is empty.
    #[error("Username is a required field")]
    MissingUsername,
    /// The username is shorter than the registration minimum.
    #[error("Username must be at least {min} characters")]
    UsernameTooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The password is empty.
    #[error("Password is a required field")]
    MissingPassword,
    /// The password is shorter than the registration minimum.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The password confirmation does not match.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Validated login form.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    username: String,
    password: SecretString,
}

impl LoginCredentials {
    /// Validate a login form.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::MissingUsername` or
    /// `CredentialError::MissingPassword` if either field is empty.
    pub fn parse(username: &str, password: SecretString) -> Result<Self, CredentialError> {
        if username.is_empty() {
            return Err(CredentialError::MissingUsername);
        }
        if password.expose_secret().is_empty() {
            return Err(CredentialError::MissingPassword);
        }
        Ok(Self {
            username: username.to_owned(),
            password,
        })
    }

    /// The username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Validated registration form.
///
/// ## Constraints
///
/// Checked in order, stopping at the first failure:
/// - Username must not be empty
/// - Username must be at least 6 characters
/// - Password must not be empty
/// - Password must be at least 6 characters
/// - Confirmation must equal the password
#[derive(Debug, Clone)]
pub struct Registration {
    username: String,
    password: SecretString,
}

impl Registration {
    /// Minimum length of a username.
    pub const MIN_USERNAME_LENGTH: usize = 6;
    /// Minimum length of a password.
    pub const MIN_PASSWORD_LENGTH: usize = 6;

    /// Validate a registration form.
    ///
    /// # Errors
    ///
    /// Returns the first `CredentialError` the form violates.
    pub fn parse(
        username: &str,
        password: SecretString,
        confirm_password: &SecretString,
    ) -> Result<Self, CredentialError> {
        if username.is_empty() {
            return Err(CredentialError::MissingUsername);
        }
        if username.chars().count() < Self::MIN_USERNAME_LENGTH {
            return Err(CredentialError::UsernameTooShort {
                min: Self::MIN_USERNAME_LENGTH,
            });
        }

        let exposed = password.expose_secret();
        if exposed.is_empty() {
            return Err(CredentialError::MissingPassword);
        }
        if exposed.chars().count() < Self::MIN_PASSWORD_LENGTH {
            return Err(CredentialError::PasswordTooShort {
                min: Self::MIN_PASSWORD_LENGTH,
            });
        }
        if exposed != confirm_password.expose_secret() {
            return Err(CredentialError::PasswordMismatch);
        }

        Ok(Self {
            username: username.to_owned(),
            password,
        })
    }

    /// The username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }
}
