//! Property-based tests for sale totals.
//!
//! - net = total + tax - discount, computed from rounded line amounts
//! - balance_due is never negative and equals max(net - paid, 0)
//! - recomputing from the same collections is stable

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use simba_shared::types::{Currency, ItemId, Money, PaymentId, Quantity, SaleId, UserId};

use super::totals::SaleTotals;
use super::types::{Payment, SaleItem};
use crate::ledger::PaymentMethod;

fn tsh(amount: Decimal) -> Money {
    Money::new(amount, Currency::Tzs)
}

/// Strategy for one line: quantity with up to 3 decimals, price in cents, tax rate.
fn line_strategy() -> impl Strategy<Value = (Decimal, Decimal, Decimal)> {
    (
        (1i64..100_000i64).prop_map(|v| Decimal::new(v, 3)),
        (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        prop_oneof![Just(Decimal::ZERO), Just(Decimal::from(18)), (0i64..=1000i64).prop_map(|v| Decimal::new(v, 1))],
    )
}

fn lines(rows: &[(Decimal, Decimal, Decimal)]) -> Vec<SaleItem> {
    let sale_id = SaleId::new();
    rows
        .iter()
        .map(|(qty, price, rate)| {
            SaleItem::new(sale_id, ItemId::new(), Quantity::new(*qty), tsh(*price), *rate).unwrap()
        })
        .collect()
}

fn payments(amounts: &[Decimal]) -> Vec<Payment> {
    amounts
        .iter()
        .map(|amount| Payment {
            id: PaymentId::new(),
            sale_id: SaleId::new(),
            amount: tsh(*amount),
            method: PaymentMethod::MobileMoney,
            reference_number: None,
            notes: None,
            payment_date: Utc::now(),
            received_by: UserId::new(),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_net_is_total_plus_tax_minus_discount(
        rows in prop::collection::vec(line_strategy(), 1..8),
        discount_cents in 0i64..1_000_000i64,
    ) {
        let items = lines(&rows);
        let discount = tsh(Decimal::new(discount_cents, 2));
        let totals = SaleTotals::compute(Currency::Tzs, &items, &[], discount).unwrap();

        let total: Decimal = items.iter().map(|line| line.total_price.amount()).sum();
        let tax: Decimal = items.iter().map(|line| line.tax_amount.amount()).sum();
        prop_assert_eq!(totals.total_amount.amount(), total);
        prop_assert_eq!(totals.tax_amount.amount(), tax);
        prop_assert_eq!(totals.net_amount.amount(), total + tax - discount.amount());
    }

    #[test]
    fn prop_line_amounts_have_two_decimals(rows in prop::collection::vec(line_strategy(), 1..8)) {
        for line in lines(&rows) {
            prop_assert!(line.total_price.amount().scale() <= 2);
            prop_assert!(line.tax_amount.amount().scale() <= 2);
            prop_assert!(!line.tax_amount.is_negative());
        }
    }

    #[test]
    fn prop_balance_due_is_never_negative(
        rows in prop::collection::vec(line_strategy(), 1..5),
        paid in prop::collection::vec((1i64..5_000_000i64).prop_map(|c| Decimal::new(c, 2)), 0..5),
    ) {
        let items = lines(&rows);
        let payments = payments(&paid);
        let totals = SaleTotals::compute(Currency::Tzs, &items, &payments, Money::zero(Currency::Tzs)).unwrap();

        let expected = (totals.net_amount.amount() - totals.amount_paid.amount()).max(Decimal::ZERO);
        prop_assert!(!totals.balance_due.is_negative());
        prop_assert_eq!(totals.balance_due.amount(), expected);
        prop_assert_eq!(totals.is_paid, expected.is_zero());
    }

    #[test]
    fn prop_recompute_is_stable(
        rows in prop::collection::vec(line_strategy(), 0..6),
        paid in prop::collection::vec((1i64..1_000_000i64).prop_map(|c| Decimal::new(c, 2)), 0..4),
    ) {
        let items = lines(&rows);
        let payments = payments(&paid);
        let zero = Money::zero(Currency::Tzs);
        let first = SaleTotals::compute(Currency::Tzs, &items, &payments, zero).unwrap();
        let second = SaleTotals::compute(Currency::Tzs, &items, &payments, first.discount_amount).unwrap();
        prop_assert_eq!(first, second);
    }
}
