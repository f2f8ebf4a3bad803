//! Double-entry ledger.
//!
//! This module implements:
//! - Accounts with balances derived from transaction legs
//! - Balanced transactions, posted only through [`posting::post_transaction`]
//! - Incomes recognized from completed sales, with cancellation by reversal

pub mod balance;
pub mod posting;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use balance::{AccountBalance, LegTotals, NormalBalance};
pub use posting::{NewTransaction, get_or_create_account, mark_income_paid, post_transaction, record_sale_income};
pub use service::{LedgerService, NewAccount, PostTransactionInput, TrialBalance};
pub use types::{
    Account, AccountType, Income, IncomeType, PaymentMethod, Transaction, TransactionType,
};
