//! QKart storefront client library.
//!
//! Talks to the QKart REST backend and keeps the client-side view state:
//! the catalog, the merged cart, the address book, and the durable session.
//! Front ends (such as the `qkart` CLI) drive it through [`state::AppState`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod services;
pub mod session;
pub mod state;

pub use error::{AppError, ErrorKind, Result};
