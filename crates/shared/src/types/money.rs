//! Money type with fixed-point decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every value is rounded half-up to two decimal places when it is built,
//! so repeated recomputation never drifts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places kept for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Amounts closer than this are treated as equal (0.005).
///
/// Used for every "is paid" and "exceeds balance" decision.
pub const PAID_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Errors raised by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Operands carry different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: Currency,
        /// Currency of the right operand.
        right: Currency,
    },

    /// Arithmetic overflowed the decimal range.
    #[error("Money arithmetic overflow")]
    Overflow,
}

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "MoneyParts", into = "MoneyParts")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

#[derive(Serialize, Deserialize)]
struct MoneyParts {
    amount: Decimal,
    currency: Currency,
}

impl From<MoneyParts> for Money {
    fn from(parts: MoneyParts) -> Self {
        Self::new(parts.amount, parts.currency)
    }
}

impl From<Money> for MoneyParts {
    fn from(money: Money) -> Self {
        Self {
            amount: money.amount,
            currency: money.currency,
        }
    }
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Tanzanian Shilling ("Tsh")
    #[default]
    #[serde(alias = "TSH")]
    Tzs,
    /// Kenyan Shilling
    Kes,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Tzs => "TZS",
            Self::Kes => "KES",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

/// Rounds half-up (away from zero on the midpoint) to [`MONEY_SCALE`] places.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

impl Money {
    /// Creates a new Money instance, rounding the amount to two places.
    #[must_use]
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: round_money(amount),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns the rounded amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    fn ensure_same_currency(&self, other: &Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }

    /// Adds two amounts of the same currency.
    pub fn add(&self, other: &Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(sum, self.currency))
    }

    /// Subtracts `other` from `self`; the result may be negative.
    pub fn subtract(&self, other: &Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let diff = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(diff, self.currency))
    }

    /// Multiplies by a decimal factor such as a quantity.
    pub fn multiply(&self, factor: Decimal) -> Result<Self, MoneyError> {
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(product, self.currency))
    }

    /// Returns `rate` percent of this amount (e.g. an 18% tax rate).
    pub fn percent(&self, rate: Decimal) -> Result<Self, MoneyError> {
        let product = self
            .amount
            .checked_mul(rate)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(product / Decimal::ONE_HUNDRED, self.currency))
    }

    /// Sums a sequence of amounts, starting from zero in `currency`.
    pub fn sum<'a, I>(currency: Currency, values: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        values
            .into_iter()
            .try_fold(Self::zero(currency), |acc, value| acc.add(value))
    }

    /// Clamps negative amounts to zero.
    #[must_use]
    pub fn max_zero(self) -> Self {
        if self.is_negative() {
            Self::zero(self.currency)
        } else {
            self
        }
    }

    /// True when both amounts are within [`PAID_TOLERANCE`] of each other.
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.currency == other.currency && (self.amount - other.amount).abs() < PAID_TOLERANCE
    }

    /// True when `self` is larger than `other` by at least [`PAID_TOLERANCE`].
    #[must_use]
    pub fn exceeds(&self, other: &Self) -> bool {
        self.amount - other.amount >= PAID_TOLERANCE
    }

    /// True when the amount is zero within [`PAID_TOLERANCE`].
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.amount < PAID_TOLERANCE
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TZS" | "TSH" => Ok(Self::Tzs),
            "KES" => Ok(Self::Kes),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
