//! Account balances derived from transaction legs.
//!
//! Balances are never stored. They are summed at query time from every
//! transaction that debits or credits the account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use simba_shared::types::{AccountId, Money};

use super::types::{Account, AccountType};

/// Which side increases an account's balance.
///
/// - Asset/Expense: balance = debits - credits (debit-normal)
/// - Liability/Equity/Revenue: balance = credits - debits (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense)
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue)
    Credit,
}

impl NormalBalance {
    /// Normal side for an account type.
    #[must_use]
    pub fn of(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Asset | AccountType::Expense => Self::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => Self::Credit,
        }
    }

    /// Balance implied by the given leg totals.
    #[must_use]
    pub fn balance(self, debit_total: Decimal, credit_total: Decimal) -> Decimal {
        match self {
            Self::Debit => debit_total - credit_total,
            Self::Credit => credit_total - debit_total,
        }
    }
}

/// Leg totals for one account, as summed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegTotals {
    /// Sum of amounts where the account is debited.
    pub debit_total: Decimal,
    /// Sum of amounts where the account is credited.
    pub credit_total: Decimal,
}

/// Derived account balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Total debit amount.
    pub debit_total: Money,
    /// Total credit amount.
    pub credit_total: Money,
    /// Net balance on the account's normal side.
    pub balance: Money,
}

impl AccountBalance {
    /// Builds the balance of `account` from its leg totals.
    #[must_use]
    pub fn from_totals(account: &Account, totals: LegTotals) -> Self {
        let side = NormalBalance::of(account.account_type);
        Self {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            debit_total: Money::new(totals.debit_total, account.currency),
            credit_total: Money::new(totals.credit_total, account.currency),
            balance: Money::new(
                side.balance(totals.debit_total, totals.credit_total),
                account.currency,
            ),
        }
    }
}
