//! Cart entries, cart items, and the entry/catalog merge.
//!
//! The backend only knows `(productId, qty)` pairs. Everything the cart view
//! needs to display and price a line comes from joining those pairs against
//! the product catalog snapshot the client currently holds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

/// A server-side cart record: how many of a product the user has in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Product in the cart.
    pub product_id: ProductId,
    /// Number of units.
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl CartEntry {
    /// Create a new cart entry.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A cart line ready for display: the catalog product plus its quantity.
///
/// Derived on every cart fetch or mutation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    /// Catalog product.
    #[serde(flatten)]
    pub product: Product,
    /// Number of units.
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl CartItem {
    /// ID of the product in this line.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Line total: unit cost times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.cost.times(self.quantity)
    }

    /// The cart entry this line was derived from.
    #[must_use]
    pub fn entry(&self) -> CartEntry {
        CartEntry {
            product_id: self.product.id.clone(),
            quantity: self.quantity,
        }
    }
}

/// Join cart entries with the product catalog.
///
/// Output follows the order of `entries`. Entries whose product is not in
/// `products` are dropped. When the catalog lists the same id twice, the
/// first record wins.
#[must_use]
pub fn merge(entries: &[CartEntry], products: &[Product]) -> Vec<CartItem> {
    if entries.is_empty() || products.is_empty() {
        return Vec::new();
    }

    let mut catalog: HashMap<&ProductId, &Product> = HashMap::with_capacity(products.len());
    for product in products {
        catalog.entry(&product.id).or_insert(product);
    }

    entries
        .iter()
        .filter_map(|entry| {
            catalog.get(&entry.product_id).map(|product| CartItem {
                product: (*product).clone(),
                quantity: entry.quantity,
            })
        })
        .collect()
}

/// Total value of a cart: the sum of `cost * quantity` over all lines.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Price {
    items.iter().map(CartItem::subtotal).sum()
}

/// Whether a product already has a line in the cart.
#[must_use]
pub fn contains_product(items: &[CartItem], product_id: &ProductId) -> bool {
    items.iter().any(|item| item.product_id() == product_id)
}

/// Current quantity of a product in the cart, or zero if it has no line.
#[must_use]
pub fn quantity_of(items: &[CartItem], product_id: &ProductId) -> u32 {
    items
        .iter()
        .find(|item| item.product_id() == product_id)
        .map_or(0, |item| item.quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, cost: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: "Test".to_string(),
            cost: Price::from_units(cost),
            rating: 5,
            image: format!("https://img.example/{id}.jpg"),
        }
    }

    #[test]
    fn test_merge_single_entry() {
        let items = merge(&[CartEntry::new("p1", 2)], &[product("p1", 50)]);

        assert_eq!(items.len(), 1);
        let item = items.first().unwrap();
        assert_eq!(item.product.cost, Price::from_units(50));
        assert_eq!(item.quantity, 2);
        assert_eq!(cart_total(&items), Price::from_units(100));
    }

    #[test]
    fn test_merge_preserves_entry_order() {
        let entries = [
            CartEntry::new("p3", 1),
            CartEntry::new("p1", 4),
            CartEntry::new("p2", 2),
        ];
        let products = [product("p1", 10), product("p2", 20), product("p3", 30)];

        let items = merge(&entries, &products);
        let ids: Vec<&str> = items.iter().map(|item| item.product_id().as_str()).collect();
        assert_eq!(ids, ["p3", "p1", "p2"]);
    }

    #[test]
    fn test_merge_drops_unknown_products() {
        let entries = [CartEntry::new("gone", 1), CartEntry::new("p1", 1)];
        let items = merge(&entries, &[product("p1", 10)]);

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().product_id().as_str(), "p1");
    }

    #[test]
    fn test_merge_disjoint_is_empty() {
        let entries = [CartEntry::new("a", 1), CartEntry::new("b", 1)];
        let products = [product("c", 1), product("d", 1)];
        assert!(merge(&entries, &products).is_empty());
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert!(merge(&[], &[product("p1", 10)]).is_empty());
        assert!(merge(&[CartEntry::new("p1", 1)], &[]).is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let entries = [CartEntry::new("p2", 3), CartEntry::new("x", 1), CartEntry::new("p1", 1)];
        let products = [product("p1", 10), product("p2", 25)];

        let first = merge(&entries, &products);
        let entries_again: Vec<CartEntry> = first.iter().map(CartItem::entry).collect();
        let second = merge(&entries_again, &products);

        assert_eq!(first, second);
    }

    #[test]
    fn test_cart_total_is_additive() {
        let products = [product("p1", 10), product("p2", 25)];
        let a = merge(&[CartEntry::new("p1", 3)], &products);
        let b = merge(&[CartEntry::new("p2", 2)], &products);
        let both = merge(&[CartEntry::new("p1", 3), CartEntry::new("p2", 2)], &products);

        assert_eq!(cart_total(&both), cart_total(&a) + cart_total(&b));
        assert_eq!(cart_total(&[]), Price::ZERO);
    }

    #[test]
    fn test_huge_costs_saturate_instead_of_overflowing() {
        let mut pricey = product("p1", 0);
        pricey.cost = Price::new(rust_decimal::Decimal::MAX);
        let products = [pricey.clone(), product("p2", 10)];

        let items = merge(&[CartEntry::new("p1", 2), CartEntry::new("p2", 1)], &products);
        assert_eq!(items.len(), 2);
        assert_eq!(cart_total(&items), pricey.cost);
    }

    #[test]
    fn test_contains_and_quantity_of() {
        let items = merge(&[CartEntry::new("p1", 3)], &[product("p1", 10)]);
        assert!(contains_product(&items, &ProductId::new("p1")));
        assert!(!contains_product(&items, &ProductId::new("p2")));
        assert_eq!(quantity_of(&items, &ProductId::new("p1")), 3);
        assert_eq!(quantity_of(&items, &ProductId::new("p2")), 0);
    }

    #[test]
    fn test_cart_entry_wire_format() {
        let entries: Vec<CartEntry> = serde_json::from_str(
            r#"[{"productId": "KCRwjF7lN97HnEaY", "qty": 3}, {"productId": "BW0jAAeDJmlZCF8i", "qty": 1}]"#,
        )
        .unwrap();

        assert_eq!(entries, [CartEntry::new("KCRwjF7lN97HnEaY", 3), CartEntry::new("BW0jAAeDJmlZCF8i", 1)]);
    }
}
