//! Sale totals, recomputed in one pass from items and payments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use simba_shared::types::{Currency, Money, MoneyError, Quantity};

use super::types::{Payment, SaleItem};

/// Every derived amount of a sale.
///
/// `net = total + tax - discount`, `balance_due = max(net - paid, 0)`,
/// `is_paid = balance_due` within the paid tolerance of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    /// Sum of line totals before tax.
    pub total_amount: Money,
    /// Sum of line taxes.
    pub tax_amount: Money,
    /// Sale-level discount.
    pub discount_amount: Money,
    /// Amount the customer owes overall.
    pub net_amount: Money,
    /// Sum of payments.
    pub amount_paid: Money,
    /// Outstanding amount, never negative.
    pub balance_due: Money,
    /// Fully paid flag.
    pub is_paid: bool,
}

/// `(total_price, tax_amount)` for one line.
pub fn line_amounts(
    quantity: Quantity,
    unit_price: Money,
    tax_rate: Decimal,
) -> Result<(Money, Money), MoneyError> {
    let total = unit_price.multiply(quantity.value())?;
    let tax = total.percent(tax_rate)?;
    Ok((total, tax))
}

impl SaleTotals {
    /// Totals of an empty sale.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            total_amount: Money::zero(currency),
            tax_amount: Money::zero(currency),
            discount_amount: Money::zero(currency),
            net_amount: Money::zero(currency),
            amount_paid: Money::zero(currency),
            balance_due: Money::zero(currency),
            is_paid: true,
        }
    }

    /// Computes totals from the full item and payment collections.
    pub fn compute(
        currency: Currency,
        items: &[SaleItem],
        payments: &[Payment],
        discount: Money,
    ) -> Result<Self, MoneyError> {
        let total_amount = Money::sum(currency, items.iter().map(|line| &line.total_price))?;
        let tax_amount = Money::sum(currency, items.iter().map(|line| &line.tax_amount))?;
        let amount_paid = Money::sum(currency, payments.iter().map(|payment| &payment.amount))?;

        let net_amount = total_amount.add(&tax_amount)?.subtract(&discount)?;
        let balance_due = net_amount.subtract(&amount_paid)?.max_zero();

        Ok(Self {
            total_amount,
            tax_amount,
            discount_amount: discount,
            net_amount,
            amount_paid,
            balance_due,
            is_paid: balance_due.is_settled(),
        })
    }
}
