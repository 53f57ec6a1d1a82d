//! Core types for QKart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod credential;
pub mod id;
pub mod price;
pub mod product;

pub use address::{Address, AddressError};
pub use credential::{CredentialError, LoginCredentials, Registration};
pub use id::*;
pub use price::Price;
pub use product::Product;
