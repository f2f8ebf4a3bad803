//! Mapping between entity models and domain types.
//!
//! Enum columns are stored as their `as_str()` form. A value that no longer
//! parses surfaces as [`StoreError::Corrupt`].

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sea_orm::{DbErr, Set, SqlErr};
use simba_core::audit::AuditEvent;
use simba_core::inventory::{
    AdjustmentType, ApprovalStatus, Item, ItemCategory, Review, StockAdjustment, StockHistory,
    StockIn, StockInSource, StockMovement, StockOut, StockOutLine, StockOutPurpose,
};
use simba_core::ledger::{
    Account, AccountType, Income, IncomeType, PaymentMethod, Transaction, TransactionType,
};
use simba_core::sales::{
    Customer, CustomerType, Payment, Sale, SaleItem, SaleStatus, SaleSummary, SaleTotals, SaleType,
};
use simba_core::store::{StoreError, StoreResult};
use simba_shared::types::{
    AccountId, Currency, CustomerId, IncomeId, ItemId, Money, PaymentId, Quantity, SaleId,
    SaleItemId, StockAdjustmentId, StockHistoryId, StockInId, StockOutId, StockOutLineId,
    TransactionId, UserId,
};
use uuid::Uuid;

use crate::entities::{
    accounts, audit_logs, customers, incomes, items, payments, sale_items, sales,
    stock_adjustments, stock_history, stock_ins, stock_out_lines, stock_outs, transactions,
};

/// Maps a `SeaORM` error onto the store's error kinds.
pub(crate) fn map_db_err(err: DbErr) -> StoreError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return StoreError::UniqueViolation(detail);
    }
    match err {
        DbErr::Conn(e) => StoreError::Connection(e.to_string()),
        DbErr::ConnectionAcquire(e) => StoreError::Connection(e.to_string()),
        other => {
            let message = other.to_string();
            if message.contains("could not serialize access") || message.contains("deadlock detected")
            {
                StoreError::Conflict(message)
            } else {
                StoreError::Query(message)
            }
        }
    }
}

fn parse_enum<T>(column: &str, value: &str, parse: fn(&str) -> Option<T>) -> StoreResult<T> {
    parse(value).ok_or_else(|| StoreError::Corrupt(format!("{column}: unrecognized value {value:?}")))
}

fn currency(column: &str, value: &str) -> StoreResult<Currency> {
    value
        .trim()
        .parse::<Currency>()
        .map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

fn utc(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn opt_utc(value: Option<DateTime<FixedOffset>>) -> Option<DateTime<Utc>> {
    value.map(utc)
}

fn fixed(value: DateTime<Utc>) -> DateTime<FixedOffset> {
    value.into()
}

fn opt_fixed(value: Option<DateTime<Utc>>) -> Option<DateTime<FixedOffset>> {
    value.map(fixed)
}

fn user(value: Uuid) -> UserId {
    UserId::from_uuid(value)
}

fn review(
    status: &str,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<FixedOffset>>,
    rejection_reason: Option<String>,
) -> StoreResult<Review> {
    Ok(Review {
        status: parse_enum("status", status, ApprovalStatus::parse)?,
        reviewed_by: reviewed_by.map(user),
        reviewed_at: opt_utc(reviewed_at),
        rejection_reason,
    })
}

// ============================================================
// INVENTORY
// ============================================================

pub(crate) fn item_from_model(model: items::Model) -> StoreResult<Item> {
    let selling_price = match (model.selling_price, model.price_currency.as_deref()) {
        (Some(amount), Some(code)) => Some(Money::new(amount, currency("price_currency", code)?)),
        (Some(amount), None) => Some(Money::new(amount, Currency::default())),
        (None, _) => None,
    };
    Ok(Item {
        id: ItemId::from_uuid(model.id),
        name: model.name,
        sku: model.sku,
        category: parse_enum("category", &model.category, ItemCategory::parse)?,
        unit_of_measure: model.unit_of_measure,
        quantity: Quantity::new(model.quantity),
        reorder_level: Quantity::new(model.reorder_level),
        minimum_stock: Quantity::new(model.minimum_stock),
        selling_price,
        is_active: model.is_active,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

pub(crate) fn item_to_active(item: &Item) -> items::ActiveModel {
    items::ActiveModel {
        id: Set(item.id.into_inner()),
        name: Set(item.name.clone()),
        sku: Set(item.sku.clone()),
        category: Set(item.category.as_str().to_string()),
        unit_of_measure: Set(item.unit_of_measure.clone()),
        quantity: Set(item.quantity.value()),
        reorder_level: Set(item.reorder_level.value()),
        minimum_stock: Set(item.minimum_stock.value()),
        selling_price: Set(item.selling_price.map(|price| price.amount())),
        price_currency: Set(item.selling_price.map(|price| price.currency().code().to_string())),
        is_active: Set(item.is_active),
        created_at: Set(fixed(item.created_at)),
        updated_at: Set(fixed(item.updated_at)),
    }
}

pub(crate) fn history_from_model(model: stock_history::Model) -> StoreResult<StockHistory> {
    Ok(StockHistory {
        id: StockHistoryId::from_uuid(model.id),
        item_id: ItemId::from_uuid(model.item_id),
        movement: parse_enum("movement", &model.movement, StockMovement::parse)?,
        quantity: Quantity::new(model.quantity),
        previous_quantity: Quantity::new(model.previous_quantity),
        new_quantity: Quantity::new(model.new_quantity),
        reference_id: model.reference_id,
        notes: model.notes,
        created_by: user(model.created_by),
        created_at: utc(model.created_at),
    })
}

pub(crate) fn history_to_active(entry: &StockHistory) -> stock_history::ActiveModel {
    stock_history::ActiveModel {
        id: Set(entry.id.into_inner()),
        item_id: Set(entry.item_id.into_inner()),
        movement: Set(entry.movement.as_str().to_string()),
        quantity: Set(entry.quantity.value()),
        previous_quantity: Set(entry.previous_quantity.value()),
        new_quantity: Set(entry.new_quantity.value()),
        reference_id: Set(entry.reference_id),
        notes: Set(entry.notes.clone()),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(fixed(entry.created_at)),
    }
}

pub(crate) fn stock_in_from_model(model: stock_ins::Model) -> StoreResult<StockIn> {
    Ok(StockIn {
        id: StockInId::from_uuid(model.id),
        item_id: ItemId::from_uuid(model.item_id),
        quantity: Quantity::new(model.quantity),
        source: parse_enum("source", &model.source, StockInSource::parse)?,
        supplier: model.supplier,
        reference: model.reference,
        notes: model.notes,
        review: review(
            &model.status,
            model.reviewed_by,
            model.reviewed_at,
            model.rejection_reason,
        )?,
        created_by: user(model.created_by),
        created_at: utc(model.created_at),
    })
}

pub(crate) fn stock_in_to_active(stock_in: &StockIn) -> stock_ins::ActiveModel {
    stock_ins::ActiveModel {
        id: Set(stock_in.id.into_inner()),
        item_id: Set(stock_in.item_id.into_inner()),
        quantity: Set(stock_in.quantity.value()),
        source: Set(stock_in.source.as_str().to_string()),
        supplier: Set(stock_in.supplier.clone()),
        reference: Set(stock_in.reference.clone()),
        notes: Set(stock_in.notes.clone()),
        status: Set(stock_in.review.status.as_str().to_string()),
        reviewed_by: Set(stock_in.review.reviewed_by.map(UserId::into_inner)),
        reviewed_at: Set(opt_fixed(stock_in.review.reviewed_at)),
        rejection_reason: Set(stock_in.review.rejection_reason.clone()),
        created_by: Set(stock_in.created_by.into_inner()),
        created_at: Set(fixed(stock_in.created_at)),
    }
}

pub(crate) fn adjustment_from_model(model: stock_adjustments::Model) -> StoreResult<StockAdjustment> {
    Ok(StockAdjustment {
        id: StockAdjustmentId::from_uuid(model.id),
        item_id: ItemId::from_uuid(model.item_id),
        adjustment_quantity: Quantity::new(model.adjustment_quantity),
        adjustment_type: parse_enum("adjustment_type", &model.adjustment_type, AdjustmentType::parse)?,
        reason: model.reason,
        review: review(
            &model.status,
            model.reviewed_by,
            model.reviewed_at,
            model.rejection_reason,
        )?,
        created_by: user(model.created_by),
        created_at: utc(model.created_at),
    })
}

pub(crate) fn adjustment_to_active(adjustment: &StockAdjustment) -> stock_adjustments::ActiveModel {
    stock_adjustments::ActiveModel {
        id: Set(adjustment.id.into_inner()),
        item_id: Set(adjustment.item_id.into_inner()),
        adjustment_quantity: Set(adjustment.adjustment_quantity.value()),
        adjustment_type: Set(adjustment.adjustment_type.as_str().to_string()),
        reason: Set(adjustment.reason.clone()),
        status: Set(adjustment.review.status.as_str().to_string()),
        reviewed_by: Set(adjustment.review.reviewed_by.map(UserId::into_inner)),
        reviewed_at: Set(opt_fixed(adjustment.review.reviewed_at)),
        rejection_reason: Set(adjustment.review.rejection_reason.clone()),
        created_by: Set(adjustment.created_by.into_inner()),
        created_at: Set(fixed(adjustment.created_at)),
    }
}

pub(crate) fn stock_out_from_model(
    model: stock_outs::Model,
    lines: Vec<stock_out_lines::Model>,
) -> StoreResult<StockOut> {
    Ok(StockOut {
        id: StockOutId::from_uuid(model.id),
        lines: lines
            .into_iter()
            .map(|line| StockOutLine {
                id: StockOutLineId::from_uuid(line.id),
                stock_out_id: StockOutId::from_uuid(line.stock_out_id),
                item_id: ItemId::from_uuid(line.item_id),
                quantity: Quantity::new(line.quantity),
            })
            .collect(),
        purpose: parse_enum("purpose", &model.purpose, StockOutPurpose::parse)?,
        linked_sale: model.linked_sale_id.map(SaleId::from_uuid),
        issued_to: model.issued_to,
        reference: model.reference,
        notes: model.notes,
        review: review(
            &model.status,
            model.reviewed_by,
            model.reviewed_at,
            model.rejection_reason,
        )?,
        created_by: user(model.created_by),
        created_at: utc(model.created_at),
    })
}

pub(crate) fn stock_out_to_active(stock_out: &StockOut) -> stock_outs::ActiveModel {
    stock_outs::ActiveModel {
        id: Set(stock_out.id.into_inner()),
        purpose: Set(stock_out.purpose.as_str().to_string()),
        linked_sale_id: Set(stock_out.linked_sale.map(SaleId::into_inner)),
        issued_to: Set(stock_out.issued_to.clone()),
        reference: Set(stock_out.reference.clone()),
        notes: Set(stock_out.notes.clone()),
        status: Set(stock_out.review.status.as_str().to_string()),
        reviewed_by: Set(stock_out.review.reviewed_by.map(UserId::into_inner)),
        reviewed_at: Set(opt_fixed(stock_out.review.reviewed_at)),
        rejection_reason: Set(stock_out.review.rejection_reason.clone()),
        created_by: Set(stock_out.created_by.into_inner()),
        created_at: Set(fixed(stock_out.created_at)),
    }
}

pub(crate) fn stock_out_line_to_active(line: &StockOutLine) -> stock_out_lines::ActiveModel {
    stock_out_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        stock_out_id: Set(line.stock_out_id.into_inner()),
        item_id: Set(line.item_id.into_inner()),
        quantity: Set(line.quantity.value()),
    }
}

// ============================================================
// SALES
// ============================================================

pub(crate) fn customer_from_model(model: customers::Model) -> StoreResult<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(model.id),
        name: model.name,
        customer_type: parse_enum("customer_type", &model.customer_type, CustomerType::parse)?,
        phone: model.phone,
        email: model.email,
        is_active: model.is_active,
        created_at: utc(model.created_at),
    })
}

pub(crate) fn customer_to_active(customer: &Customer) -> customers::ActiveModel {
    customers::ActiveModel {
        id: Set(customer.id.into_inner()),
        name: Set(customer.name.clone()),
        customer_type: Set(customer.customer_type.as_str().to_string()),
        phone: Set(customer.phone.clone()),
        email: Set(customer.email.clone()),
        is_active: Set(customer.is_active),
        created_at: Set(fixed(customer.created_at)),
    }
}

fn sale_totals(model: &sales::Model, currency: Currency) -> SaleTotals {
    let money = |amount: Decimal| Money::new(amount, currency);
    SaleTotals {
        total_amount: money(model.total_amount),
        tax_amount: money(model.tax_amount),
        discount_amount: money(model.discount_amount),
        net_amount: money(model.net_amount),
        amount_paid: money(model.amount_paid),
        balance_due: money(model.balance_due),
        is_paid: model.is_paid,
    }
}

pub(crate) fn sale_from_models(
    model: sales::Model,
    lines: Vec<sale_items::Model>,
    received: Vec<payments::Model>,
) -> StoreResult<Sale> {
    let currency = currency("currency", &model.currency)?;
    let items = lines
        .into_iter()
        .map(|line| sale_item_from_model(line, currency))
        .collect();
    let payments = received
        .into_iter()
        .map(payment_from_model)
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Sale {
        id: SaleId::from_uuid(model.id),
        totals: sale_totals(&model, currency),
        sale_type: parse_enum("sale_type", &model.sale_type, SaleType::parse)?,
        status: parse_enum("status", &model.status, SaleStatus::parse)?,
        customer_id: CustomerId::from_uuid(model.customer_id),
        sale_number: model.sale_number,
        currency,
        items,
        payments,
        inventory_stock_out: model.inventory_stock_out_id.map(StockOutId::from_uuid),
        is_stock_out_requested: model.is_stock_out_requested,
        stock_out_request_date: opt_utc(model.stock_out_request_date),
        stock_out_processed_date: opt_utc(model.stock_out_processed_date),
        approved_by: model.approved_by.map(user),
        approved_at: opt_utc(model.approved_at),
        notes: model.notes,
        created_by: user(model.created_by),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

pub(crate) fn sale_summary_from_model(model: sales::Model, item_count: usize) -> StoreResult<SaleSummary> {
    let currency = currency("currency", &model.currency)?;
    let totals = sale_totals(&model, currency);
    Ok(SaleSummary {
        id: SaleId::from_uuid(model.id),
        status: parse_enum("status", &model.status, SaleStatus::parse)?,
        sale_number: model.sale_number,
        customer_id: CustomerId::from_uuid(model.customer_id),
        item_count,
        net_amount: totals.net_amount,
        amount_paid: totals.amount_paid,
        balance_due: totals.balance_due,
        is_paid: totals.is_paid,
        created_at: utc(model.created_at),
    })
}

pub(crate) fn sale_to_active(sale: &Sale) -> sales::ActiveModel {
    let totals = &sale.totals;
    sales::ActiveModel {
        id: Set(sale.id.into_inner()),
        sale_number: Set(sale.sale_number.clone()),
        sale_type: Set(sale.sale_type.as_str().to_string()),
        customer_id: Set(sale.customer_id.into_inner()),
        status: Set(sale.status.as_str().to_string()),
        currency: Set(sale.currency.code().to_string()),
        total_amount: Set(totals.total_amount.amount()),
        tax_amount: Set(totals.tax_amount.amount()),
        discount_amount: Set(totals.discount_amount.amount()),
        net_amount: Set(totals.net_amount.amount()),
        amount_paid: Set(totals.amount_paid.amount()),
        balance_due: Set(totals.balance_due.amount()),
        is_paid: Set(totals.is_paid),
        inventory_stock_out_id: Set(sale.inventory_stock_out.map(StockOutId::into_inner)),
        is_stock_out_requested: Set(sale.is_stock_out_requested),
        stock_out_request_date: Set(opt_fixed(sale.stock_out_request_date)),
        stock_out_processed_date: Set(opt_fixed(sale.stock_out_processed_date)),
        approved_by: Set(sale.approved_by.map(UserId::into_inner)),
        approved_at: Set(opt_fixed(sale.approved_at)),
        notes: Set(sale.notes.clone()),
        created_by: Set(sale.created_by.into_inner()),
        created_at: Set(fixed(sale.created_at)),
        updated_at: Set(fixed(sale.updated_at)),
    }
}

fn sale_item_from_model(model: sale_items::Model, currency: Currency) -> SaleItem {
    SaleItem {
        id: SaleItemId::from_uuid(model.id),
        sale_id: SaleId::from_uuid(model.sale_id),
        item_id: ItemId::from_uuid(model.item_id),
        quantity: Quantity::new(model.quantity),
        unit_price: Money::new(model.unit_price, currency),
        tax_rate: model.tax_rate,
        total_price: Money::new(model.total_price, currency),
        tax_amount: Money::new(model.tax_amount, currency),
        is_stocked_out: model.is_stocked_out,
        stock_out_date: opt_utc(model.stock_out_date),
    }
}

pub(crate) fn sale_item_to_active(item: &SaleItem) -> sale_items::ActiveModel {
    sale_items::ActiveModel {
        id: Set(item.id.into_inner()),
        sale_id: Set(item.sale_id.into_inner()),
        item_id: Set(item.item_id.into_inner()),
        quantity: Set(item.quantity.value()),
        unit_price: Set(item.unit_price.amount()),
        tax_rate: Set(item.tax_rate),
        total_price: Set(item.total_price.amount()),
        tax_amount: Set(item.tax_amount.amount()),
        is_stocked_out: Set(item.is_stocked_out),
        stock_out_date: Set(opt_fixed(item.stock_out_date)),
    }
}

fn payment_from_model(model: payments::Model) -> StoreResult<Payment> {
    Ok(Payment {
        id: PaymentId::from_uuid(model.id),
        sale_id: SaleId::from_uuid(model.sale_id),
        amount: Money::new(model.amount, currency("currency", &model.currency)?),
        method: parse_enum("method", &model.method, PaymentMethod::parse)?,
        reference_number: model.reference_number,
        notes: model.notes,
        payment_date: utc(model.payment_date),
        received_by: user(model.received_by),
    })
}

pub(crate) fn payment_to_active(payment: &Payment) -> payments::ActiveModel {
    payments::ActiveModel {
        id: Set(payment.id.into_inner()),
        sale_id: Set(payment.sale_id.into_inner()),
        amount: Set(payment.amount.amount()),
        currency: Set(payment.amount.currency().code().to_string()),
        method: Set(payment.method.as_str().to_string()),
        reference_number: Set(payment.reference_number.clone()),
        notes: Set(payment.notes.clone()),
        payment_date: Set(fixed(payment.payment_date)),
        received_by: Set(payment.received_by.into_inner()),
    }
}

// ============================================================
// LEDGER
// ============================================================

pub(crate) fn account_from_model(model: accounts::Model) -> StoreResult<Account> {
    Ok(Account {
        id: AccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        account_type: parse_enum("account_type", &model.account_type, AccountType::parse)?,
        currency: currency("currency", &model.currency)?,
        is_active: model.is_active,
        created_at: utc(model.created_at),
    })
}

pub(crate) fn account_to_active(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.as_str().to_string()),
        currency: Set(account.currency.code().to_string()),
        is_active: Set(account.is_active),
        created_at: Set(fixed(account.created_at)),
    }
}

pub(crate) fn transaction_from_model(model: transactions::Model) -> StoreResult<Transaction> {
    Ok(Transaction {
        id: TransactionId::from_uuid(model.id),
        debit_account_id: AccountId::from_uuid(model.debit_account_id),
        credit_account_id: AccountId::from_uuid(model.credit_account_id),
        amount: Money::new(model.amount, currency("currency", &model.currency)?),
        transaction_type: parse_enum(
            "transaction_type",
            &model.transaction_type,
            TransactionType::parse,
        )?,
        description: model.description,
        income_id: model.income_id.map(IncomeId::from_uuid),
        created_by: user(model.created_by),
        created_at: utc(model.created_at),
    })
}

pub(crate) fn transaction_to_active(transaction: &Transaction) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        debit_account_id: Set(transaction.debit_account_id.into_inner()),
        credit_account_id: Set(transaction.credit_account_id.into_inner()),
        amount: Set(transaction.amount.amount()),
        currency: Set(transaction.amount.currency().code().to_string()),
        transaction_type: Set(transaction.transaction_type.as_str().to_string()),
        description: Set(transaction.description.clone()),
        income_id: Set(transaction.income_id.map(IncomeId::into_inner)),
        created_by: Set(transaction.created_by.into_inner()),
        created_at: Set(fixed(transaction.created_at)),
    }
}

pub(crate) fn income_from_model(model: incomes::Model) -> StoreResult<Income> {
    let payment_method = model
        .payment_method
        .as_deref()
        .map(|value| parse_enum("payment_method", value, PaymentMethod::parse))
        .transpose()?;
    Ok(Income {
        id: IncomeId::from_uuid(model.id),
        amount: Money::new(model.amount, currency("currency", &model.currency)?),
        income_type: parse_enum("income_type", &model.income_type, IncomeType::parse)?,
        source: model.source,
        sale_id: model.sale_id.map(SaleId::from_uuid),
        reference: model.reference,
        is_paid: model.is_paid,
        payment_date: opt_utc(model.payment_date),
        payment_method,
        is_cancelled: model.is_cancelled,
        cancelled_by: model.cancelled_by.map(user),
        cancelled_at: opt_utc(model.cancelled_at),
        cancellation_reason: model.cancellation_reason,
        created_by: user(model.created_by),
        created_at: utc(model.created_at),
    })
}

pub(crate) fn income_to_active(income: &Income) -> incomes::ActiveModel {
    incomes::ActiveModel {
        id: Set(income.id.into_inner()),
        source: Set(income.source.clone()),
        amount: Set(income.amount.amount()),
        currency: Set(income.amount.currency().code().to_string()),
        income_type: Set(income.income_type.as_str().to_string()),
        sale_id: Set(income.sale_id.map(SaleId::into_inner)),
        reference: Set(income.reference.clone()),
        is_paid: Set(income.is_paid),
        payment_date: Set(opt_fixed(income.payment_date)),
        payment_method: Set(income.payment_method.map(|method| method.as_str().to_string())),
        is_cancelled: Set(income.is_cancelled),
        cancelled_by: Set(income.cancelled_by.map(UserId::into_inner)),
        cancelled_at: Set(opt_fixed(income.cancelled_at)),
        cancellation_reason: Set(income.cancellation_reason.clone()),
        created_by: Set(income.created_by.into_inner()),
        created_at: Set(fixed(income.created_at)),
    }
}

// ============================================================
// AUDIT
// ============================================================

pub(crate) fn audit_to_active(event: AuditEvent) -> audit_logs::ActiveModel {
    audit_logs::ActiveModel {
        id: Set(event.id.into_inner()),
        actor_id: Set(event.actor_id.into_inner()),
        actor_name: Set(event.actor_name),
        action: Set(event.action.as_str().to_string()),
        module: Set(event.module.as_str().to_string()),
        object_type: Set(event.object_type),
        object_id: Set(event.object_id),
        description: Set(event.description),
        before_data: Set(event.before),
        after_data: Set(event.after),
        occurred_at: Set(fixed(event.occurred_at)),
    }
}
