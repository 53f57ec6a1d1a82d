//! Type-safe price representation using decimal arithmetic.
//!
//! QKart prices and wallet balances are plain amounts in a single currency.
//! They travel as JSON numbers and render as `$<amount>`.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount (product cost, cart total, or wallet balance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// The zero amount. Shipping is always charged at this price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at the largest representable amount.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0.normalize())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_units(50).to_string(), "$50");
        assert_eq!(Price::new(Decimal::new(1999, 2)).to_string(), "$19.99");
        assert_eq!(Price::new(Decimal::new(1000, 2)).to_string(), "$10");
    }

    #[test]
    fn test_price_times_and_sum() {
        let total: Price = [Price::from_units(50).times(2), Price::from_units(5)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_units(105));
        assert_eq!(Price::from_units(7).times(0), Price::ZERO);
    }

    #[test]
    fn test_price_arithmetic_saturates() {
        let max = Price::new(Decimal::MAX);
        assert_eq!(max.times(3), max);
        assert_eq!(max + Price::from_units(1), max);
        assert_eq!(Price::new(Decimal::MIN) - Price::from_units(1), Price::new(Decimal::MIN));

        let total: Price = [max.times(2), max].into_iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_price_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("100").unwrap();
        assert_eq!(price, Price::from_units(100));

        let price: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(price, Price::new(Decimal::new(125, 1)));
    }

    #[test]
    fn test_price_serializes_as_number() {
        let json = serde_json::to_value(Price::from_units(100)).unwrap();
        assert!(json.is_number());
    }
}
