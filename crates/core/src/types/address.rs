//! Shipping address type.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// Errors that can occur when validating a new address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The address text is empty or whitespace.
    #[error("Address cannot be empty")]
    Empty,
}

/// A user-owned shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Backend address ID.
    #[serde(rename = "_id")]
    pub id: AddressId,
    /// Free-form address text.
    #[serde(rename = "address")]
    pub text: String,
}

impl Address {
    /// Validate the text of an address before it is sent to the backend.
    ///
    /// Returns the trimmed text.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Empty` if the text is blank.
    pub fn validate_text(text: &str) -> Result<&str, AddressError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(trimmed)
    }
}
