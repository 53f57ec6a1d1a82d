//! QKart Core - Shared domain types and cart/checkout logic.
//!
//! This crate provides the domain model used across all QKart components:
//! - `storefront` - Client library for the QKart REST backend
//! - `cli` - Command-line storefront built on the client library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. Everything here can be exercised without a
//! backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, products, addresses, and credentials
//! - [`cart`] - Cart entries, cart items, and the entry/catalog merge
//! - [`checkout`] - Checkout preconditions and the order placement workflow

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{CartEntry, CartItem, cart_total, merge};
pub use checkout::{
    CheckoutFailure, CheckoutRejection, CheckoutRequest, CheckoutState, InvalidTransition,
    ValidatedOrder,
};
pub use types::*;
