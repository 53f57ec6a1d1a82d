//! Storefront services.
//!
//! Each service owns one slice of view state and mutates it only after the
//! backend call it depends on has completed.
//!
//! # Services
//!
//! - `auth` - Login, registration, and logout
//! - `catalog` - Product listing with caching, and search
//! - `search` - Trailing-debounced search over keystroke input
//! - `cart` - Cart fetch and mutation, re-merged against the catalog
//! - `address` - Saved addresses and the selected shipping address
//! - `checkout` - Order placement and wallet balance bookkeeping

pub mod address;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod search;

pub use address::AddressBook;
pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::{CatalogService, SearchOutcome};
pub use checkout::CheckoutService;
pub use search::{LatestSearch, ProductSearch, SearchDebouncer, SearchResult};
