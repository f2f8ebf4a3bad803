//! Postgres-backed implementation of the store traits.
//!
//! A [`PgTx`] wraps one database transaction. `*_for_update` lookups issue
//! `SELECT .. FOR UPDATE`, so the row lock lasts until the transaction
//! commits or is dropped (dropping rolls back).

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
    TransactionTrait,
};
use simba_core::inventory::{Item, StockAdjustment, StockHistory, StockIn, StockOut};
use simba_core::ledger::{Account, Income, LegTotals, Transaction};
use simba_core::sales::{Customer, Payment, Sale, SaleItem, SaleSummary};
use simba_core::store::{
    ItemFilter, ItemRepository, LedgerRepository, SaleFilter, SaleRepository, StockRepository,
    Store, StoreError, StoreResult, StoreTx,
};
use simba_shared::types::{
    AccountId, CustomerId, IncomeId, ItemId, PageRequest, SaleId, SaleItemId, StockAdjustmentId,
    StockInId, StockOutId,
};
use uuid::Uuid;

use crate::convert::{
    account_from_model, account_to_active, adjustment_from_model, adjustment_to_active,
    customer_from_model, customer_to_active, history_from_model, history_to_active,
    income_from_model, income_to_active, item_from_model, item_to_active, map_db_err,
    payment_to_active, sale_from_models, sale_item_to_active, sale_summary_from_model,
    sale_to_active, stock_in_from_model, stock_in_to_active, stock_out_from_model,
    stock_out_line_to_active, stock_out_to_active, transaction_from_model, transaction_to_active,
};
use crate::entities::{
    accounts, customers, incomes, items, payments, sale_items, sales, stock_adjustments,
    stock_history, stock_ins, stock_out_lines, stock_outs, transactions,
};

const LEG_TOTALS_SQL: &str = r"
SELECT
    COALESCE(SUM(CASE WHEN debit_account_id = $1 THEN amount ELSE 0 END), 0) AS debit_total,
    COALESCE(SUM(CASE WHEN credit_account_id = $1 THEN amount ELSE 0 END), 0) AS credit_total
FROM transactions
WHERE debit_account_id = $1 OR credit_account_id = $1
";

#[derive(Debug, FromQueryResult)]
struct LegTotalsRow {
    debit_total: Decimal,
    credit_total: Decimal,
}

/// Opens Postgres units of work over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    /// Creates a store over an established connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        Ok(PgTx { txn })
    }
}

/// One database transaction.
pub struct PgTx {
    txn: DatabaseTransaction,
}

impl std::fmt::Debug for PgTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTx").finish_non_exhaustive()
    }
}

impl StoreTx for PgTx {
    async fn commit(self) -> StoreResult<()> {
        self.txn.commit().await.map_err(map_db_err)
    }
}

fn page_window(page: PageRequest) -> (u64, u64) {
    (page.offset(), page.limit())
}

fn not_updated(entity: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::Query(format!("{entity} {id} does not exist"))
}

impl PgTx {
    async fn stock_out_lines(&self, id: Uuid) -> StoreResult<Vec<stock_out_lines::Model>> {
        stock_out_lines::Entity::find()
            .filter(stock_out_lines::Column::StockOutId.eq(id))
            .order_by_asc(stock_out_lines::Column::Id)
            .all(&self.txn)
            .await
            .map_err(map_db_err)
    }

    async fn load_sale(&self, model: Option<sales::Model>) -> StoreResult<Option<Sale>> {
        let Some(model) = model else {
            return Ok(None);
        };
        let lines = sale_items::Entity::find()
            .filter(sale_items::Column::SaleId.eq(model.id))
            .order_by_asc(sale_items::Column::Id)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;
        let received = payments::Entity::find()
            .filter(payments::Column::SaleId.eq(model.id))
            .order_by_asc(payments::Column::Id)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;
        sale_from_models(model, lines, received).map(Some)
    }
}

impl ItemRepository for PgTx {
    async fn find_item(&mut self, id: ItemId) -> StoreResult<Option<Item>> {
        items::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(item_from_model)
            .transpose()
    }

    async fn find_items_for_update(&mut self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        items::Entity::find()
            .filter(items::Column::Id.is_in(keys))
            .order_by_asc(items::Column::Id)
            .lock_exclusive()
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(item_from_model)
            .collect()
    }

    async fn find_active_item_by_name(&mut self, name: &str) -> StoreResult<Option<Item>> {
        let key = simba_core::inventory::naming::name_key(name);
        items::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(items::Column::Name))).eq(key))
            .filter(items::Column::IsActive.eq(true))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(item_from_model)
            .transpose()
    }

    async fn find_item_by_sku(&mut self, sku: &str) -> StoreResult<Option<Item>> {
        items::Entity::find()
            .filter(items::Column::Sku.eq(sku))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(item_from_model)
            .transpose()
    }

    async fn insert_item(&mut self, item: &Item) -> StoreResult<()> {
        items::Entity::insert(item_to_active(item))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> StoreResult<()> {
        let updated = items::Entity::update_many()
            .set(item_to_active(item))
            .filter(items::Column::Id.eq(item.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        if updated.rows_affected == 0 {
            return Err(not_updated("item", item.id));
        }
        Ok(())
    }

    async fn list_items(
        &mut self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<Item>, u64)> {
        let mut query = items::Entity::find();
        if !filter.include_inactive {
            query = query.filter(items::Column::IsActive.eq(true));
        }
        if let Some(category) = filter.category {
            query = query.filter(items::Column::Category.eq(category.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(items::Column::Name))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(items::Column::Sku))).like(pattern)),
            );
        }

        let total = query.clone().count(&self.txn).await.map_err(map_db_err)?;
        let (offset, limit) = page_window(page);
        let rows = query
            .order_by_asc(items::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;
        let items = rows
            .into_iter()
            .map(item_from_model)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn insert_stock_history(&mut self, entry: &StockHistory) -> StoreResult<()> {
        stock_history::Entity::insert(history_to_active(entry))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_stock_history(&mut self, item: ItemId) -> StoreResult<Vec<StockHistory>> {
        stock_history::Entity::find()
            .filter(stock_history::Column::ItemId.eq(item.into_inner()))
            .order_by_asc(stock_history::Column::CreatedAt)
            .order_by_asc(stock_history::Column::Id)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(history_from_model)
            .collect()
    }
}

impl StockRepository for PgTx {
    async fn insert_stock_in(&mut self, stock_in: &StockIn) -> StoreResult<()> {
        stock_ins::Entity::insert(stock_in_to_active(stock_in))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_stock_in_for_update(&mut self, id: StockInId) -> StoreResult<Option<StockIn>> {
        stock_ins::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(stock_in_from_model)
            .transpose()
    }

    async fn update_stock_in(&mut self, stock_in: &StockIn) -> StoreResult<()> {
        let updated = stock_ins::Entity::update_many()
            .set(stock_in_to_active(stock_in))
            .filter(stock_ins::Column::Id.eq(stock_in.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        if updated.rows_affected == 0 {
            return Err(not_updated("stock_in", stock_in.id));
        }
        Ok(())
    }

    async fn insert_adjustment(&mut self, adjustment: &StockAdjustment) -> StoreResult<()> {
        stock_adjustments::Entity::insert(adjustment_to_active(adjustment))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_adjustment_for_update(
        &mut self,
        id: StockAdjustmentId,
    ) -> StoreResult<Option<StockAdjustment>> {
        stock_adjustments::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(adjustment_from_model)
            .transpose()
    }

    async fn update_adjustment(&mut self, adjustment: &StockAdjustment) -> StoreResult<()> {
        let updated = stock_adjustments::Entity::update_many()
            .set(adjustment_to_active(adjustment))
            .filter(stock_adjustments::Column::Id.eq(adjustment.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        if updated.rows_affected == 0 {
            return Err(not_updated("stock_adjustment", adjustment.id));
        }
        Ok(())
    }

    async fn insert_stock_out(&mut self, stock_out: &StockOut) -> StoreResult<()> {
        stock_outs::Entity::insert(stock_out_to_active(stock_out))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        if !stock_out.lines.is_empty() {
            stock_out_lines::Entity::insert_many(stock_out.lines.iter().map(stock_out_line_to_active))
                .exec_without_returning(&self.txn)
                .await
                .map_err(map_db_err)?;
        }
        Ok(())
    }

    async fn find_stock_out(&mut self, id: StockOutId) -> StoreResult<Option<StockOut>> {
        let Some(model) = stock_outs::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };
        let lines = self.stock_out_lines(model.id).await?;
        stock_out_from_model(model, lines).map(Some)
    }

    async fn find_stock_out_for_update(&mut self, id: StockOutId) -> StoreResult<Option<StockOut>> {
        let Some(model) = stock_outs::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };
        let lines = self.stock_out_lines(model.id).await?;
        stock_out_from_model(model, lines).map(Some)
    }

    async fn update_stock_out(&mut self, stock_out: &StockOut) -> StoreResult<()> {
        let updated = stock_outs::Entity::update_many()
            .set(stock_out_to_active(stock_out))
            .filter(stock_outs::Column::Id.eq(stock_out.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        if updated.rows_affected == 0 {
            return Err(not_updated("stock_out", stock_out.id));
        }
        Ok(())
    }

    async fn delete_stock_out(&mut self, id: StockOutId) -> StoreResult<()> {
        stock_out_lines::Entity::delete_many()
            .filter(stock_out_lines::Column::StockOutId.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        stock_outs::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}

impl SaleRepository for PgTx {
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        customers::Entity::insert(customer_to_active(customer))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_customer(&mut self, id: CustomerId) -> StoreResult<Option<Customer>> {
        customers::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(customer_from_model)
            .transpose()
    }

    async fn find_customer_by_name(&mut self, name: &str) -> StoreResult<Option<Customer>> {
        customers::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(customers::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(customer_from_model)
            .transpose()
    }

    async fn insert_sale(&mut self, sale: &Sale) -> StoreResult<()> {
        sales::Entity::insert(sale_to_active(sale))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_sale(&mut self, id: SaleId) -> StoreResult<Option<Sale>> {
        let model = sales::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;
        self.load_sale(model).await
    }

    async fn find_sale_for_update(&mut self, id: SaleId) -> StoreResult<Option<Sale>> {
        let model = sales::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;
        self.load_sale(model).await
    }

    async fn update_sale(&mut self, sale: &Sale) -> StoreResult<()> {
        let updated = sales::Entity::update_many()
            .set(sale_to_active(sale))
            .filter(sales::Column::Id.eq(sale.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        if updated.rows_affected == 0 {
            return Err(not_updated("sale", sale.id));
        }
        Ok(())
    }

    async fn insert_sale_item(&mut self, item: &SaleItem) -> StoreResult<()> {
        sale_items::Entity::insert(sale_item_to_active(item))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn update_sale_item(&mut self, item: &SaleItem) -> StoreResult<()> {
        let updated = sale_items::Entity::update_many()
            .set(sale_item_to_active(item))
            .filter(sale_items::Column::Id.eq(item.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        if updated.rows_affected == 0 {
            return Err(not_updated("sale_item", item.id));
        }
        Ok(())
    }

    async fn delete_sale_item(&mut self, id: SaleItemId) -> StoreResult<()> {
        sale_items::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        payments::Entity::insert(payment_to_active(payment))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_sales(
        &mut self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<SaleSummary>, u64)> {
        let mut query = sales::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(sales::Column::Status.eq(status.as_str()));
        }
        if let Some(customer) = filter.customer_id {
            query = query.filter(sales::Column::CustomerId.eq(customer.into_inner()));
        }

        let total = query.clone().count(&self.txn).await.map_err(map_db_err)?;
        let (offset, limit) = page_window(page);
        let rows = query
            .order_by_desc(sales::Column::CreatedAt)
            .order_by_desc(sales::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|sale| sale.id).collect();
        let counts: Vec<(Uuid, i64)> = if ids.is_empty() {
            Vec::new()
        } else {
            sale_items::Entity::find()
                .select_only()
                .column(sale_items::Column::SaleId)
                .column_as(sale_items::Column::Id.count(), "item_count")
                .filter(sale_items::Column::SaleId.is_in(ids))
                .group_by(sale_items::Column::SaleId)
                .into_tuple()
                .all(&self.txn)
                .await
                .map_err(map_db_err)?
        };

        let summaries = rows
            .into_iter()
            .map(|sale| {
                let item_count = counts
                    .iter()
                    .find(|(id, _)| *id == sale.id)
                    .map_or(0, |(_, count)| usize::try_from(*count).unwrap_or_default());
                sale_summary_from_model(sale, item_count)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((summaries, total))
    }
}

impl LedgerRepository for PgTx {
    async fn find_account_by_code(&mut self, code: &str) -> StoreResult<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(account_from_model)
            .transpose()
    }

    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(account_from_model)
            .transpose()
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        accounts::Entity::insert(account_to_active(account))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>> {
        accounts::Entity::find()
            .order_by_asc(accounts::Column::Code)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(account_from_model)
            .collect()
    }

    async fn account_leg_totals(&mut self, id: AccountId) -> StoreResult<LegTotals> {
        let row = LegTotalsRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            LEG_TOTALS_SQL,
            [id.into_inner().into()],
        ))
        .one(&self.txn)
        .await
        .map_err(map_db_err)?;
        Ok(row.map_or_else(LegTotals::default, |row| LegTotals {
            debit_total: row.debit_total,
            credit_total: row.credit_total,
        }))
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        transactions::Entity::insert(transaction_to_active(transaction))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_transactions_for_income(
        &mut self,
        income: IncomeId,
    ) -> StoreResult<Vec<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::IncomeId.eq(income.into_inner()))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(transaction_from_model)
            .collect()
    }

    async fn list_transactions(&mut self, page: PageRequest) -> StoreResult<(Vec<Transaction>, u64)> {
        let total = transactions::Entity::find()
            .count(&self.txn)
            .await
            .map_err(map_db_err)?;
        let (offset, limit) = page_window(page);
        let rows = transactions::Entity::find()
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;
        let transactions = rows
            .into_iter()
            .map(transaction_from_model)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((transactions, total))
    }

    async fn insert_income(&mut self, income: &Income) -> StoreResult<()> {
        incomes::Entity::insert(income_to_active(income))
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_income_for_update(&mut self, id: IncomeId) -> StoreResult<Option<Income>> {
        incomes::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(income_from_model)
            .transpose()
    }

    async fn find_income_by_sale(&mut self, sale: SaleId) -> StoreResult<Option<Income>> {
        incomes::Entity::find()
            .filter(incomes::Column::SaleId.eq(sale.into_inner()))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(income_from_model)
            .transpose()
    }

    async fn update_income(&mut self, income: &Income) -> StoreResult<()> {
        let updated = incomes::Entity::update_many()
            .set(income_to_active(income))
            .filter(incomes::Column::Id.eq(income.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        if updated.rows_affected == 0 {
            return Err(not_updated("income", income.id));
        }
        Ok(())
    }

    async fn list_incomes(&mut self, page: PageRequest) -> StoreResult<(Vec<Income>, u64)> {
        let total = incomes::Entity::find()
            .count(&self.txn)
            .await
            .map_err(map_db_err)?;
        let (offset, limit) = page_window(page);
        let rows = incomes::Entity::find()
            .order_by_desc(incomes::Column::CreatedAt)
            .order_by_desc(incomes::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;
        let incomes = rows
            .into_iter()
            .map(income_from_model)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((incomes, total))
    }
}
