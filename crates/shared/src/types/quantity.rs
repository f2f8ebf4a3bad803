//! Stock quantity with three decimal places (supports kilograms, litres).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places kept for quantities.
pub const QUANTITY_SCALE: u32 = 3;

/// A fixed-point stock quantity.
///
/// Rounded half-up to three places on construction and after every
/// operation. Negative values only appear as adjustment deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a quantity, rounding to three places.
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Creates a whole-unit quantity.
    #[must_use]
    pub fn units(value: i64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if strictly below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Largest magnitude the stock columns hold (15 integer digits, 3 decimals).
    #[must_use]
    pub fn max() -> Self {
        Self(Decimal::new(999_999_999_999_999_999, QUANTITY_SCALE))
    }

    /// Returns true if the value fits the stock columns.
    #[must_use]
    pub fn is_storable(&self) -> bool {
        self.0.abs() <= Self::max().0
    }

    /// Adds two quantities, returning `None` on overflow or when the sum
    /// no longer fits the stock columns.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0
            .checked_add(other.0)
            .map(Self::new)
            .filter(Self::is_storable)
    }

    /// Subtracts `other`, returning `None` if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self::new)
            .filter(|result| !result.is_negative())
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl std::ops::Neg for Quantity {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_rounds_to_three_places() {
        assert_eq!(Quantity::new(dec!(1.0005)).value(), dec!(1.001));
        assert_eq!(Quantity::new(dec!(1.0004)).value(), dec!(1.000));
        assert_eq!(Quantity::new(dec!(-2.0005)).value(), dec!(-2.001));
    }

    #[test]
    fn test_checked_sub_refuses_negative() {
        let stock = Quantity::units(5);
        assert_eq!(stock.checked_sub(Quantity::units(5)), Some(Quantity::ZERO));
        assert_eq!(stock.checked_sub(Quantity::units(10)), None);
        assert_eq!(-stock, Quantity::units(-5));
    }

    #[test]
    fn test_checked_add_stops_at_column_limit() {
        let max = Quantity::max();
        assert!(max.is_storable());
        assert_eq!(max.checked_add(Quantity::units(1)), None);
        assert_eq!(max.checked_add(-Quantity::units(1)), Some(Quantity::new(dec!(999999999999998.999))));
        assert!(!Quantity::new(Decimal::MAX).is_storable());
        assert_eq!(Quantity::new(Decimal::MAX).checked_add(Quantity::new(Decimal::MAX)), None);
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(Quantity::new(dec!(40.500)).to_string(), "40.5");
        assert_eq!(Quantity::units(40).to_string(), "40");
    }

    #[test]
    fn test_deserialize_rounds() {
        let quantity: Quantity = serde_json::from_str("\"0.12345\"").unwrap();
        assert_eq!(quantity.value(), dec!(0.123));
    }

    fn arb_quantity() -> impl Strategy<Value = Quantity> {
        (0i64..10_000_000i64).prop_map(|n| Quantity::new(Decimal::new(n, 3)))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Repeated in/out movements never drift from exact arithmetic.
        #[test]
        fn prop_add_then_sub_is_identity(a in arb_quantity(), b in arb_quantity()) {
            let sum = a.checked_add(b).unwrap();
            prop_assert_eq!(sum.checked_sub(b), Some(a));
        }

        /// checked_sub succeeds exactly when there is enough stock.
        #[test]
        fn prop_checked_sub_matches_ordering(a in arb_quantity(), b in arb_quantity()) {
            prop_assert_eq!(a.checked_sub(b).is_some(), a >= b);
        }
    }
}
