//! Catalog product record.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product in the QKart catalog.
///
/// Created server-side and never modified by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend product ID.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Category the product belongs to (e.g., "Phones").
    pub category: String,
    /// Unit price.
    pub cost: Price,
    /// Aggregate rating, out of five.
    pub rating: u8,
    /// Product image URL.
    pub image: String,
}
