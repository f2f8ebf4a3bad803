//! Ledger domain types: accounts, transactions, and incomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simba_shared::types::{AccountId, Currency, IncomeId, Money, SaleId, TransactionId, UserId};
use std::fmt;

/// Chart-of-accounts classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Cash, bank, receivables.
    Asset,
    /// Payables and loans.
    Liability,
    /// Owner's equity.
    Equity,
    /// Sales and other income.
    Revenue,
    /// Costs.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the account type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart-of-accounts entry. It stores no balance; see [`super::AccountBalance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Unique account code, e.g. `"1000"`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Currency every leg on this account must use.
    pub currency: Currency,
    /// Inactive accounts refuse new postings.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Business reason for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Income recognition.
    Income,
    /// Expense payment.
    Expense,
    /// Payroll payment.
    Payroll,
    /// Transfer between own accounts.
    Transfer,
    /// Correction or reversal.
    Adjustment,
}

impl TransactionType {
    /// Returns the string representation of the transaction type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Payroll => "PAYROLL",
            Self::Transfer => "TRANSFER",
            Self::Adjustment => "ADJUSTMENT",
        }
    }

    /// Parses a transaction type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INCOME" => Some(Self::Income),
            "EXPENSE" => Some(Self::Expense),
            "PAYROLL" => Some(Self::Payroll),
            "TRANSFER" => Some(Self::Transfer),
            "ADJUSTMENT" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A balanced double-entry record: one amount, one debit leg, one credit leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier.
    pub id: TransactionId,
    /// Account debited.
    pub debit_account_id: AccountId,
    /// Account credited.
    pub credit_account_id: AccountId,
    /// Amount on both legs.
    pub amount: Money,
    /// Business reason.
    pub transaction_type: TransactionType,
    /// Narrative.
    pub description: String,
    /// Income this transaction recognizes or reverses.
    pub income_id: Option<IncomeId>,
    /// Poster.
    pub created_by: UserId,
    /// Posting time.
    pub created_at: DateTime<Utc>,
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Credit card.
    CreditCard,
    /// Mobile money (M-Pesa, Tigo Pesa...).
    MobileMoney,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Cheque => "CHEQUE",
            Self::CreditCard => "CREDIT_CARD",
            Self::MobileMoney => "MOBILE_MONEY",
            Self::Other => "OTHER",
        }
    }

    /// Parses a method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CASH" => Some(Self::Cash),
            "BANK_TRANSFER" => Some(Self::BankTransfer),
            "CHEQUE" => Some(Self::Cheque),
            "CREDIT_CARD" => Some(Self::CreditCard),
            "MOBILE_MONEY" => Some(Self::MobileMoney),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Income classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeType {
    /// Goods sold.
    Sales,
    /// Services rendered.
    Service,
    /// Interest earned.
    Interest,
    /// Anything else.
    Other,
}

impl IncomeType {
    /// Returns the string representation of the income type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "SALES",
            Self::Service => "SERVICE",
            Self::Interest => "INTEREST",
            Self::Other => "OTHER",
        }
    }

    /// Parses an income type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SALES" => Some(Self::Sales),
            "SERVICE" => Some(Self::Service),
            "INTEREST" => Some(Self::Interest),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Recognized revenue. At most one income exists per sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    /// Income identifier.
    pub id: IncomeId,
    /// Narrative source, e.g. `"Sale: SALE-..."`.
    pub source: String,
    /// Recognized amount.
    pub amount: Money,
    /// Classification.
    pub income_type: IncomeType,
    /// Originating sale (unique).
    pub sale_id: Option<SaleId>,
    /// External reference (the sale number for sale income).
    pub reference: Option<String>,
    /// True once the originating sale is fully paid.
    pub is_paid: bool,
    /// When it was settled.
    pub payment_date: Option<DateTime<Utc>>,
    /// How it was settled.
    pub payment_method: Option<PaymentMethod>,
    /// Cancelled incomes have a reversing transaction.
    pub is_cancelled: bool,
    /// Who cancelled it.
    pub cancelled_by: Option<UserId>,
    /// When it was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why it was cancelled.
    pub cancellation_reason: Option<String>,
    /// Creator.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
