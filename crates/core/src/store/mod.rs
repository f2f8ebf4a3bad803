//! Persistence traits the services run against.
//!
//! A [`Store`] opens units of work. A [`StoreTx`] is one unit of work:
//! every repository call made through it commits together on
//! [`StoreTx::commit`], and dropping it without committing rolls
//! everything back. `*_for_update` lookups take a row lock held until the
//! unit of work ends.
//!
//! These traits are implemented by the db crate (Postgres) and by
//! [`MemoryStore`] for tests and local tooling.

pub mod memory;

use std::future::Future;

use simba_shared::types::{
    AccountId, CustomerId, IncomeId, ItemId, PageRequest, SaleId, SaleItemId, StockAdjustmentId,
    StockInId, StockOutId,
};
use thiserror::Error;

use crate::inventory::{Item, ItemCategory, StockAdjustment, StockHistory, StockIn, StockOut};
use crate::ledger::{Account, Income, LegTotals, Transaction};
use crate::sales::{Customer, Payment, Sale, SaleItem, SaleStatus, SaleSummary};

pub use memory::MemoryStore;

/// Persistence failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Could not reach the backing store.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query failed.
    #[error("Query error: {0}")]
    Query(String),

    /// A unique index rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Serialization failure or deadlock; the unit of work may be retried.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Stored data could not be mapped to the domain model.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns true if retrying the unit of work may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Connection(_))
    }
}

/// Result alias for repository calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Item list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Case-insensitive substring of the name or SKU.
    pub search: Option<String>,
    /// Restrict to a category.
    pub category: Option<ItemCategory>,
    /// Include inactive items.
    pub include_inactive: bool,
}

/// Sale list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    /// Restrict to a status.
    pub status: Option<SaleStatus>,
    /// Restrict to a customer.
    pub customer_id: Option<CustomerId>,
}

/// Items, stock history.
pub trait ItemRepository: Send {
    /// Find an item by ID.
    fn find_item(&mut self, id: ItemId) -> impl Future<Output = StoreResult<Option<Item>>> + Send;

    /// Lock and load items, in ascending id order. Missing ids are skipped.
    fn find_items_for_update(
        &mut self,
        ids: &[ItemId],
    ) -> impl Future<Output = StoreResult<Vec<Item>>> + Send;

    /// Find an active item whose name matches case-insensitively.
    fn find_active_item_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<Item>>> + Send;

    /// Find an item by SKU.
    fn find_item_by_sku(&mut self, sku: &str)
    -> impl Future<Output = StoreResult<Option<Item>>> + Send;

    /// Insert a new item.
    fn insert_item(&mut self, item: &Item) -> impl Future<Output = StoreResult<()>> + Send;

    /// Persist item changes.
    fn update_item(&mut self, item: &Item) -> impl Future<Output = StoreResult<()>> + Send;

    /// Page of items plus the total count.
    fn list_items(
        &mut self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<Item>, u64)>> + Send;

    /// Append a stock history entry.
    fn insert_stock_history(
        &mut self,
        entry: &StockHistory,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// History of one item, oldest first.
    fn list_stock_history(
        &mut self,
        item: ItemId,
    ) -> impl Future<Output = StoreResult<Vec<StockHistory>>> + Send;
}

/// Stock-in receipts, adjustments, and stock-out requests.
pub trait StockRepository: Send {
    /// Insert a stock-in receipt.
    fn insert_stock_in(&mut self, stock_in: &StockIn) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lock and load a stock-in receipt.
    fn find_stock_in_for_update(
        &mut self,
        id: StockInId,
    ) -> impl Future<Output = StoreResult<Option<StockIn>>> + Send;

    /// Persist the receipt's review.
    fn update_stock_in(&mut self, stock_in: &StockIn) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert an adjustment request.
    fn insert_adjustment(
        &mut self,
        adjustment: &StockAdjustment,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lock and load an adjustment request.
    fn find_adjustment_for_update(
        &mut self,
        id: StockAdjustmentId,
    ) -> impl Future<Output = StoreResult<Option<StockAdjustment>>> + Send;

    /// Persist the adjustment's review.
    fn update_adjustment(
        &mut self,
        adjustment: &StockAdjustment,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert a stock-out with its lines.
    fn insert_stock_out(&mut self, stock_out: &StockOut)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Load a stock-out with its lines, without locking.
    fn find_stock_out(
        &mut self,
        id: StockOutId,
    ) -> impl Future<Output = StoreResult<Option<StockOut>>> + Send;

    /// Lock and load a stock-out with its lines.
    fn find_stock_out_for_update(
        &mut self,
        id: StockOutId,
    ) -> impl Future<Output = StoreResult<Option<StockOut>>> + Send;

    /// Persist the stock-out's review.
    fn update_stock_out(&mut self, stock_out: &StockOut)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Void a stock-out and its lines.
    fn delete_stock_out(&mut self, id: StockOutId) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Customers, sales, sale items, payments.
pub trait SaleRepository: Send {
    /// Insert a customer.
    fn insert_customer(&mut self, customer: &Customer)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Find a customer by ID.
    fn find_customer(
        &mut self,
        id: CustomerId,
    ) -> impl Future<Output = StoreResult<Option<Customer>>> + Send;

    /// Find a customer by exact name, ignoring case.
    fn find_customer_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<Customer>>> + Send;

    /// Insert a sale header. Items and payments are inserted separately.
    fn insert_sale(&mut self, sale: &Sale) -> impl Future<Output = StoreResult<()>> + Send;

    /// Load a sale with its items and payments.
    fn find_sale(&mut self, id: SaleId) -> impl Future<Output = StoreResult<Option<Sale>>> + Send;

    /// Lock the sale row and load the aggregate.
    fn find_sale_for_update(
        &mut self,
        id: SaleId,
    ) -> impl Future<Output = StoreResult<Option<Sale>>> + Send;

    /// Persist header fields and totals. Items and payments are untouched.
    fn update_sale(&mut self, sale: &Sale) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert a line.
    fn insert_sale_item(&mut self, item: &SaleItem) -> impl Future<Output = StoreResult<()>> + Send;

    /// Persist a line.
    fn update_sale_item(&mut self, item: &SaleItem) -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove a line.
    fn delete_sale_item(&mut self, id: SaleItemId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Append a payment.
    fn insert_payment(&mut self, payment: &Payment) -> impl Future<Output = StoreResult<()>> + Send;

    /// Page of sale summaries, newest first, plus the total count.
    fn list_sales(
        &mut self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<SaleSummary>, u64)>> + Send;
}

/// Accounts, transactions, incomes.
pub trait LedgerRepository: Send {
    /// Find an account by code.
    fn find_account_by_code(
        &mut self,
        code: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Find an account by ID.
    fn find_account(
        &mut self,
        id: AccountId,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Insert an account.
    fn insert_account(&mut self, account: &Account) -> impl Future<Output = StoreResult<()>> + Send;

    /// Every account ordered by code.
    fn list_accounts(&mut self) -> impl Future<Output = StoreResult<Vec<Account>>> + Send;

    /// Sum of debit and credit legs on an account.
    fn account_leg_totals(
        &mut self,
        id: AccountId,
    ) -> impl Future<Output = StoreResult<LegTotals>> + Send;

    /// Insert a transaction.
    fn insert_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Transactions linked to an income, oldest first.
    fn list_transactions_for_income(
        &mut self,
        income: IncomeId,
    ) -> impl Future<Output = StoreResult<Vec<Transaction>>> + Send;

    /// Page of transactions, newest first, plus the total count.
    fn list_transactions(
        &mut self,
        page: PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<Transaction>, u64)>> + Send;

    /// Insert an income. Fails with [`StoreError::UniqueViolation`] if the sale already has one.
    fn insert_income(&mut self, income: &Income) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lock and load an income.
    fn find_income_for_update(
        &mut self,
        id: IncomeId,
    ) -> impl Future<Output = StoreResult<Option<Income>>> + Send;

    /// Income recognized for a sale, if any.
    fn find_income_by_sale(
        &mut self,
        sale: SaleId,
    ) -> impl Future<Output = StoreResult<Option<Income>>> + Send;

    /// Persist income changes.
    fn update_income(&mut self, income: &Income) -> impl Future<Output = StoreResult<()>> + Send;

    /// Page of incomes, newest first, plus the total count.
    fn list_incomes(
        &mut self,
        page: PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<Income>, u64)>> + Send;
}

/// One unit of work over every repository.
pub trait StoreTx: ItemRepository + StockRepository + SaleRepository + LedgerRepository + Send {
    /// Commits every change made through this unit of work.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Opens units of work.
pub trait Store: Send + Sync + 'static {
    /// The unit-of-work type.
    type Tx: StoreTx;

    /// Begins a unit of work.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;
}
