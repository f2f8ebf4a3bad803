//! Sale aggregate types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use simba_shared::types::{
    Currency, CustomerId, ItemId, Money, MoneyError, PaymentId, Quantity, SaleId, SaleItemId,
    StockOutId, UserId,
};
use std::fmt;

use super::totals::{SaleTotals, line_amounts};
use crate::ledger::PaymentMethod;

/// Sale lifecycle status.
///
/// DRAFT → PENDING → APPROVED → STOCK_OUT_PENDING → COMPLETED, with
/// CANCELLED reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Being drafted; items may change.
    Draft,
    /// Submitted for approval.
    Pending,
    /// Approved; stock-out may be requested.
    Approved,
    /// Waiting on inventory to approve the stock-out.
    StockOutPending,
    /// Stock deducted and income recognized (terminal).
    Completed,
    /// Cancelled (terminal).
    Cancelled,
}

impl SaleStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Pending,
        Self::Approved,
        Self::StockOutPending,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::StockOutPending => "STOCK_OUT_PENDING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "STOCK_OUT_PENDING" => Some(Self::StockOutPending),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for COMPLETED and CANCELLED.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial terms of the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleType {
    /// Paid at the counter.
    #[default]
    Cash,
    /// Invoiced, paid later.
    Credit,
    /// Goods on consignment.
    Consignment,
}

impl SaleType {
    /// Returns the string representation of the sale type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Credit => "CREDIT",
            Self::Consignment => "CONSIGNMENT",
        }
    }

    /// Parses a sale type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CASH" => Some(Self::Cash),
            "CREDIT" => Some(Self::Credit),
            "CONSIGNMENT" => Some(Self::Consignment),
            _ => None,
        }
    }
}

/// Customer classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerType {
    /// A person.
    #[default]
    Individual,
    /// A business.
    Company,
    /// A government body.
    Government,
    /// Anything else.
    Other,
}

impl CustomerType {
    /// Returns the string representation of the customer type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "INDIVIDUAL",
            Self::Company => "COMPANY",
            Self::Government => "GOVERNMENT",
            Self::Other => "OTHER",
        }
    }

    /// Parses a customer type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INDIVIDUAL" => Some(Self::Individual),
            "COMPANY" => Some(Self::Company),
            "GOVERNMENT" => Some(Self::Government),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer identifier.
    pub id: CustomerId,
    /// Unique name.
    pub name: String,
    /// Classification.
    pub customer_type: CustomerType,
    /// Contact phone.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Inactive customers cannot start new sales.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One priced line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    /// Line identifier.
    pub id: SaleItemId,
    /// Owning sale.
    pub sale_id: SaleId,
    /// Sold item.
    pub item_id: ItemId,
    /// Quantity sold (> 0).
    pub quantity: Quantity,
    /// Price per unit (> 0).
    pub unit_price: Money,
    /// Tax rate in percent.
    pub tax_rate: Decimal,
    /// `round2(quantity * unit_price)`.
    pub total_price: Money,
    /// `round2(total_price * tax_rate / 100)`.
    pub tax_amount: Money,
    /// Set when the stock-out for the sale is approved.
    pub is_stocked_out: bool,
    /// When the line left the store.
    pub stock_out_date: Option<DateTime<Utc>>,
}

impl SaleItem {
    /// Builds a line and derives its amounts.
    pub fn new(
        sale_id: SaleId,
        item_id: ItemId,
        quantity: Quantity,
        unit_price: Money,
        tax_rate: Decimal,
    ) -> Result<Self, MoneyError> {
        let (total_price, tax_amount) = line_amounts(quantity, unit_price, tax_rate)?;
        Ok(Self {
            id: SaleItemId::new(),
            sale_id,
            item_id,
            quantity,
            unit_price,
            tax_rate,
            total_price,
            tax_amount,
            is_stocked_out: false,
            stock_out_date: None,
        })
    }
}

/// A completed payment against a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier.
    pub id: PaymentId,
    /// Paid sale.
    pub sale_id: SaleId,
    /// Amount received (> 0).
    pub amount: Money,
    /// How it was paid.
    pub method: PaymentMethod,
    /// Bank or mobile money reference.
    pub reference_number: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When it was received.
    pub payment_date: DateTime<Utc>,
    /// Who received it.
    pub received_by: UserId,
}

/// The sale aggregate: header, items, payments, and derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Sale identifier.
    pub id: SaleId,
    /// Human readable number, e.g. `SALE-20261014093000-1a2b`.
    pub sale_number: String,
    /// Commercial terms.
    pub sale_type: SaleType,
    /// Buyer.
    pub customer_id: CustomerId,
    /// Lifecycle status.
    pub status: SaleStatus,
    /// Currency of every amount on the sale.
    pub currency: Currency,
    /// Lines in insertion order.
    pub items: Vec<SaleItem>,
    /// Payments in insertion order.
    pub payments: Vec<Payment>,
    /// Derived amounts, always recomputed together.
    pub totals: SaleTotals,
    /// Linked stock-out request, at most one at a time.
    pub inventory_stock_out: Option<StockOutId>,
    /// True while a stock-out request is outstanding or approved.
    pub is_stock_out_requested: bool,
    /// When the stock-out was requested.
    pub stock_out_request_date: Option<DateTime<Utc>>,
    /// When the stock-out approval completed the sale.
    pub stock_out_processed_date: Option<DateTime<Utc>>,
    /// Approver.
    pub approved_by: Option<UserId>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creator.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change time.
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Recomputes every derived amount from the current items and payments.
    pub fn recalculate_totals(&mut self) -> Result<(), MoneyError> {
        self.totals = SaleTotals::compute(
            self.currency,
            &self.items,
            &self.payments,
            self.totals.discount_amount,
        )?;
        Ok(())
    }

    /// Line for `item`, if present.
    #[must_use]
    pub fn item_line(&self, item: ItemId) -> Option<&SaleItem> {
        self.items.iter().find(|line| line.item_id == item)
    }

    /// Read projection for lists.
    #[must_use]
    pub fn summary(&self) -> SaleSummary {
        SaleSummary {
            id: self.id,
            sale_number: self.sale_number.clone(),
            customer_id: self.customer_id,
            status: self.status,
            item_count: self.items.len(),
            net_amount: self.totals.net_amount,
            amount_paid: self.totals.amount_paid,
            balance_due: self.totals.balance_due,
            is_paid: self.totals.is_paid,
            created_at: self.created_at,
        }
    }
}

/// Sale list projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSummary {
    /// Sale identifier.
    pub id: SaleId,
    /// Sale number.
    pub sale_number: String,
    /// Buyer.
    pub customer_id: CustomerId,
    /// Status.
    pub status: SaleStatus,
    /// Number of lines.
    pub item_count: usize,
    /// Net amount.
    pub net_amount: Money,
    /// Paid so far.
    pub amount_paid: Money,
    /// Outstanding.
    pub balance_due: Money,
    /// Fully paid flag.
    pub is_paid: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
