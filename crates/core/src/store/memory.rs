//! In-memory store with serializable units of work.
//!
//! `begin` takes the store-wide lock and works on a private copy of the
//! state; `commit` writes the copy back. Units of work therefore run one
//! at a time, and a dropped unit of work leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use simba_shared::types::{
    AccountId, CustomerId, IncomeId, ItemId, PageRequest, SaleId, SaleItemId, StockAdjustmentId,
    StockInId, StockOutId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    ItemFilter, ItemRepository, LedgerRepository, SaleFilter, SaleRepository, StockRepository,
    Store, StoreError, StoreResult, StoreTx,
};
use crate::inventory::naming::name_key;
use crate::inventory::{Item, StockAdjustment, StockHistory, StockIn, StockOut};
use crate::ledger::{Account, Income, LegTotals, Transaction};
use crate::sales::{Customer, Payment, Sale, SaleItem, SaleSummary};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    items: BTreeMap<ItemId, Item>,
    history: Vec<StockHistory>,
    stock_ins: BTreeMap<StockInId, StockIn>,
    adjustments: BTreeMap<StockAdjustmentId, StockAdjustment>,
    stock_outs: BTreeMap<StockOutId, StockOut>,
    customers: BTreeMap<CustomerId, Customer>,
    sales: BTreeMap<SaleId, Sale>,
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    incomes: BTreeMap<IncomeId, Income>,
}

/// Shared in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// A unit of work over [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

impl StoreTx for MemoryTx {
    async fn commit(self) -> StoreResult<()> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

fn missing(entity: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::Query(format!("{entity} {id} does not exist"))
}

fn page_of<T: Clone>(values: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = values.len() as u64;
    (page.window(values), total)
}

impl ItemRepository for MemoryTx {
    async fn find_item(&mut self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.working.items.get(&id).cloned())
    }

    async fn find_items_for_update(&mut self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .iter()
            .filter_map(|id| self.working.items.get(id).cloned())
            .collect())
    }

    async fn find_active_item_by_name(&mut self, name: &str) -> StoreResult<Option<Item>> {
        let key = name_key(name);
        Ok(self
            .working
            .items
            .values()
            .find(|item| item.is_active && name_key(&item.name) == key)
            .cloned())
    }

    async fn find_item_by_sku(&mut self, sku: &str) -> StoreResult<Option<Item>> {
        Ok(self
            .working
            .items
            .values()
            .find(|item| item.sku.as_deref() == Some(sku))
            .cloned())
    }

    async fn insert_item(&mut self, item: &Item) -> StoreResult<()> {
        let key = name_key(&item.name);
        let clash = self.working.items.values().any(|existing| {
            (existing.is_active && item.is_active && name_key(&existing.name) == key)
                || (item.sku.is_some() && existing.sku == item.sku)
        });
        if clash {
            return Err(StoreError::UniqueViolation(format!("item {}", item.name)));
        }
        self.working.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> StoreResult<()> {
        let slot = self
            .working
            .items
            .get_mut(&item.id)
            .ok_or_else(|| missing("item", item.id))?;
        *slot = item.clone();
        Ok(())
    }

    async fn list_items(
        &mut self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<Item>, u64)> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut matching: Vec<Item> = self
            .working
            .items
            .values()
            .filter(|item| filter.include_inactive || item.is_active)
            .filter(|item| filter.category.is_none_or(|c| item.category == c))
            .filter(|item| {
                search.as_deref().is_none_or(|needle| {
                    item.name.to_lowercase().contains(needle)
                        || item
                            .sku
                            .as_deref()
                            .is_some_and(|sku| sku.to_lowercase().contains(needle))
                })
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page_of(matching, page))
    }

    async fn insert_stock_history(&mut self, entry: &StockHistory) -> StoreResult<()> {
        self.working.history.push(entry.clone());
        Ok(())
    }

    async fn list_stock_history(&mut self, item: ItemId) -> StoreResult<Vec<StockHistory>> {
        Ok(self
            .working
            .history
            .iter()
            .filter(|entry| entry.item_id == item)
            .cloned()
            .collect())
    }
}

impl StockRepository for MemoryTx {
    async fn insert_stock_in(&mut self, stock_in: &StockIn) -> StoreResult<()> {
        self.working.stock_ins.insert(stock_in.id, stock_in.clone());
        Ok(())
    }

    async fn find_stock_in_for_update(&mut self, id: StockInId) -> StoreResult<Option<StockIn>> {
        Ok(self.working.stock_ins.get(&id).cloned())
    }

    async fn update_stock_in(&mut self, stock_in: &StockIn) -> StoreResult<()> {
        let slot = self
            .working
            .stock_ins
            .get_mut(&stock_in.id)
            .ok_or_else(|| missing("stock_in", stock_in.id))?;
        slot.review = stock_in.review.clone();
        Ok(())
    }

    async fn insert_adjustment(&mut self, adjustment: &StockAdjustment) -> StoreResult<()> {
        self.working
            .adjustments
            .insert(adjustment.id, adjustment.clone());
        Ok(())
    }

    async fn find_adjustment_for_update(
        &mut self,
        id: StockAdjustmentId,
    ) -> StoreResult<Option<StockAdjustment>> {
        Ok(self.working.adjustments.get(&id).cloned())
    }

    async fn update_adjustment(&mut self, adjustment: &StockAdjustment) -> StoreResult<()> {
        let slot = self
            .working
            .adjustments
            .get_mut(&adjustment.id)
            .ok_or_else(|| missing("stock_adjustment", adjustment.id))?;
        slot.review = adjustment.review.clone();
        Ok(())
    }

    async fn insert_stock_out(&mut self, stock_out: &StockOut) -> StoreResult<()> {
        self.working
            .stock_outs
            .insert(stock_out.id, stock_out.clone());
        Ok(())
    }

    async fn find_stock_out(&mut self, id: StockOutId) -> StoreResult<Option<StockOut>> {
        Ok(self.working.stock_outs.get(&id).cloned())
    }

    async fn find_stock_out_for_update(&mut self, id: StockOutId) -> StoreResult<Option<StockOut>> {
        Ok(self.working.stock_outs.get(&id).cloned())
    }

    async fn update_stock_out(&mut self, stock_out: &StockOut) -> StoreResult<()> {
        let slot = self
            .working
            .stock_outs
            .get_mut(&stock_out.id)
            .ok_or_else(|| missing("stock_out", stock_out.id))?;
        slot.review = stock_out.review.clone();
        Ok(())
    }

    async fn delete_stock_out(&mut self, id: StockOutId) -> StoreResult<()> {
        self.working.stock_outs.remove(&id);
        Ok(())
    }
}

impl MemoryTx {
    fn sale_mut(&mut self, id: SaleId) -> StoreResult<&mut Sale> {
        self.working
            .sales
            .get_mut(&id)
            .ok_or_else(|| missing("sale", id))
    }
}

impl SaleRepository for MemoryTx {
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        let lower = customer.name.to_lowercase();
        if self
            .working
            .customers
            .values()
            .any(|existing| existing.name.to_lowercase() == lower)
        {
            return Err(StoreError::UniqueViolation(format!("customer {}", customer.name)));
        }
        self.working.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn find_customer(&mut self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.working.customers.get(&id).cloned())
    }

    async fn find_customer_by_name(&mut self, name: &str) -> StoreResult<Option<Customer>> {
        let lower = name.trim().to_lowercase();
        Ok(self
            .working
            .customers
            .values()
            .find(|customer| customer.name.to_lowercase() == lower)
            .cloned())
    }

    async fn insert_sale(&mut self, sale: &Sale) -> StoreResult<()> {
        let mut header = sale.clone();
        header.items.clear();
        header.payments.clear();
        self.working.sales.insert(sale.id, header);
        Ok(())
    }

    async fn find_sale(&mut self, id: SaleId) -> StoreResult<Option<Sale>> {
        Ok(self.working.sales.get(&id).cloned())
    }

    async fn find_sale_for_update(&mut self, id: SaleId) -> StoreResult<Option<Sale>> {
        Ok(self.working.sales.get(&id).cloned())
    }

    async fn update_sale(&mut self, sale: &Sale) -> StoreResult<()> {
        let stored = self.sale_mut(sale.id)?;
        let items = std::mem::take(&mut stored.items);
        let payments = std::mem::take(&mut stored.payments);
        *stored = Sale {
            items,
            payments,
            ..sale.clone()
        };
        Ok(())
    }

    async fn insert_sale_item(&mut self, item: &SaleItem) -> StoreResult<()> {
        self.sale_mut(item.sale_id)?.items.push(item.clone());
        Ok(())
    }

    async fn update_sale_item(&mut self, item: &SaleItem) -> StoreResult<()> {
        let sale = self.sale_mut(item.sale_id)?;
        let slot = sale
            .items
            .iter_mut()
            .find(|line| line.id == item.id)
            .ok_or_else(|| missing("sale_item", item.id))?;
        *slot = item.clone();
        Ok(())
    }

    async fn delete_sale_item(&mut self, id: SaleItemId) -> StoreResult<()> {
        for sale in self.working.sales.values_mut() {
            sale.items.retain(|line| line.id != id);
        }
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        self.sale_mut(payment.sale_id)?.payments.push(payment.clone());
        Ok(())
    }

    async fn list_sales(
        &mut self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<SaleSummary>, u64)> {
        let matching: Vec<SaleSummary> = self
            .working
            .sales
            .values()
            .rev()
            .filter(|sale| filter.status.is_none_or(|status| sale.status == status))
            .filter(|sale| filter.customer_id.is_none_or(|customer| sale.customer_id == customer))
            .map(Sale::summary)
            .collect();
        Ok(page_of(matching, page))
    }
}

impl LedgerRepository for MemoryTx {
    async fn find_account_by_code(&mut self, code: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .working
            .accounts
            .values()
            .find(|account| account.code == code)
            .cloned())
    }

    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.working.accounts.get(&id).cloned())
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        if self
            .working
            .accounts
            .values()
            .any(|existing| existing.code == account.code)
        {
            return Err(StoreError::UniqueViolation(format!("account {}", account.code)));
        }
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.working.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn account_leg_totals(&mut self, id: AccountId) -> StoreResult<LegTotals> {
        Ok(self
            .working
            .transactions
            .iter()
            .fold(LegTotals::default(), |mut totals, transaction| {
                if transaction.debit_account_id == id {
                    totals.debit_total += transaction.amount.amount();
                }
                if transaction.credit_account_id == id {
                    totals.credit_total += transaction.amount.amount();
                }
                totals
            }))
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        self.working.transactions.push(transaction.clone());
        Ok(())
    }

    async fn list_transactions_for_income(&mut self, income: IncomeId) -> StoreResult<Vec<Transaction>> {
        Ok(self
            .working
            .transactions
            .iter()
            .filter(|transaction| transaction.income_id == Some(income))
            .cloned()
            .collect())
    }

    async fn list_transactions(&mut self, page: PageRequest) -> StoreResult<(Vec<Transaction>, u64)> {
        let newest_first: Vec<Transaction> = self.working.transactions.iter().rev().cloned().collect();
        Ok(page_of(newest_first, page))
    }

    async fn insert_income(&mut self, income: &Income) -> StoreResult<()> {
        if let Some(sale) = income.sale_id {
            if self
                .working
                .incomes
                .values()
                .any(|existing| existing.sale_id == Some(sale))
            {
                return Err(StoreError::UniqueViolation(format!("income for sale {sale}")));
            }
        }
        self.working.incomes.insert(income.id, income.clone());
        Ok(())
    }

    async fn find_income_for_update(&mut self, id: IncomeId) -> StoreResult<Option<Income>> {
        Ok(self.working.incomes.get(&id).cloned())
    }

    async fn find_income_by_sale(&mut self, sale: SaleId) -> StoreResult<Option<Income>> {
        Ok(self
            .working
            .incomes
            .values()
            .find(|income| income.sale_id == Some(sale))
            .cloned())
    }

    async fn update_income(&mut self, income: &Income) -> StoreResult<()> {
        let slot = self
            .working
            .incomes
            .get_mut(&income.id)
            .ok_or_else(|| missing("income", income.id))?;
        *slot = income.clone();
        Ok(())
    }

    async fn list_incomes(&mut self, page: PageRequest) -> StoreResult<(Vec<Income>, u64)> {
        let newest_first: Vec<Income> = self.working.incomes.values().rev().cloned().collect();
        Ok(page_of(newest_first, page))
    }
}
