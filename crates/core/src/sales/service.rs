//! Sales service: customers, the sale aggregate, payments.
//!
//! Every mutation of an existing sale takes the sale's lock, then opens a
//! unit of work and row-locks the sale before checking its status.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use simba_shared::LedgerConfig;
use simba_shared::types::{
    Currency, CustomerId, ItemId, Money, MoneyError, PageRequest, PageResponse, PaymentId, Quantity, SaleId,
    SaleItemId,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{Customer, CustomerType, Payment, Sale, SaleItem, SaleStatus, SaleSummary, SaleType};
use super::totals::SaleTotals;
use super::workflow::SaleWorkflow;
use crate::access::{Actor, Module};
use crate::audit::{AuditAction, AuditBatch, AuditEvent, AuditSink};
use crate::error::CoreError;
use crate::inventory::service::{ensure_storable, insert_stock_out, stock_out_created_event};
use crate::inventory::{ApprovalStatus, NewStockOut, StockOut, StockOutLineInput, StockOutPurpose, StockShortage};
use crate::ledger::{PaymentMethod, mark_income_paid};
use crate::locks::SaleLocks;
use crate::store::{ItemRepository, SaleFilter, SaleRepository, StockRepository, Store, StoreTx};

/// Largest accepted tax rate, in percent.
const MAX_TAX_RATE: Decimal = Decimal::ONE_HUNDRED;

/// Input for [`SalesService::create_customer`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    /// Unique name.
    pub name: String,
    /// Classification.
    #[serde(default)]
    pub customer_type: CustomerType,
    /// Contact phone.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
}

/// Input for [`SalesService::create_sale`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    /// Buyer.
    pub customer_id: CustomerId,
    /// Commercial terms.
    #[serde(default)]
    pub sale_type: SaleType,
    /// Notes.
    pub notes: Option<String>,
}

/// Input for [`SalesService::add_item`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSaleItem {
    /// Item sold.
    pub item_id: ItemId,
    /// Quantity sold.
    pub quantity: Quantity,
    /// Price per unit; the item's selling price when omitted.
    pub unit_price: Option<Money>,
    /// Tax rate in percent.
    #[serde(default)]
    pub tax_rate: Decimal,
}

/// Input for [`SalesService::record_payment`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    /// Amount received.
    pub amount: Money,
    /// How it was paid.
    pub method: PaymentMethod,
    /// Bank or mobile money reference.
    pub reference_number: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

/// Sale operations. Mutations require the [`Module::Sales`] capability.
pub struct SalesService<S: Store> {
    store: S,
    locks: Arc<SaleLocks>,
    audit: Arc<dyn AuditSink>,
    config: LedgerConfig,
}

impl<S: Store> SalesService<S> {
    /// Creates a sales service sharing `locks` with inventory and reconciliation.
    pub fn new(store: S, locks: Arc<SaleLocks>, config: LedgerConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            locks,
            audit,
            config,
        }
    }

    // ========== Customers ==========

    /// Creates a customer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Duplicate`] if the name is taken.
    pub async fn create_customer(&self, input: NewCustomer, actor: &Actor) -> Result<Customer, CoreError> {
        actor.require(Module::Sales)?;
        let name = input.name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(CoreError::Validation("customer name is required".into()));
        }

        let mut tx = self.store.begin().await?;
        if tx.find_customer_by_name(&name).await?.is_some() {
            return Err(CoreError::Duplicate { entity: "customer", key: name });
        }
        let customer = Customer {
            id: CustomerId::new(),
            name,
            customer_type: input.customer_type,
            phone: input.phone,
            email: input.email,
            is_active: true,
            created_at: Utc::now(),
        };
        tx.insert_customer(&customer).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Create,
                Module::Sales,
                "customer",
                customer.id,
                format!("Created customer {}", customer.name),
            )
            .with_after(&customer),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(customer)
    }

    // ========== Drafting ==========

    /// Opens a DRAFT sale.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown customer and
    /// [`CoreError::Validation`] for an inactive one.
    pub async fn create_sale(&self, input: NewSale, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        let mut tx = self.store.begin().await?;
        let customer = tx
            .find_customer(input.customer_id)
            .await?
            .ok_or_else(|| CoreError::not_found("customer", input.customer_id))?;
        if !customer.is_active {
            return Err(CoreError::Validation(format!("customer {} is inactive", customer.name)));
        }

        let now = Utc::now();
        let currency = self.config.currency;
        let sale = Sale {
            id: SaleId::new(),
            sale_number: sale_number(now),
            sale_type: input.sale_type,
            customer_id: customer.id,
            status: SaleStatus::Draft,
            currency,
            items: Vec::new(),
            payments: Vec::new(),
            totals: SaleTotals::zero(currency),
            inventory_stock_out: None,
            is_stock_out_requested: false,
            stock_out_request_date: None,
            stock_out_processed_date: None,
            approved_by: None,
            approved_at: None,
            notes: input.notes,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };
        tx.insert_sale(&sale).await?;

        let mut audit = AuditBatch::new();
        audit.push(sale_event(actor, AuditAction::Create, &sale, format!("Created sale {}", sale.sale_number)));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(sale_id = %sale.id, sale_number = %sale.sale_number, customer = %customer.name, "sale created");
        Ok(sale)
    }

    /// Adds a line to a DRAFT sale and recomputes totals.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for bad amounts or a repeated item
    /// and [`CoreError::InsufficientStock`] if current stock cannot cover it.
    pub async fn add_item(&self, sale_id: SaleId, input: NewSaleItem, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        if !input.quantity.is_positive() {
            return Err(CoreError::Validation("quantity must be positive".into()));
        }
        ensure_storable("quantity", input.quantity)?;
        if input.tax_rate < Decimal::ZERO || input.tax_rate > MAX_TAX_RATE {
            return Err(CoreError::Validation(format!(
                "tax rate must be between 0 and 100, got {}",
                input.tax_rate
            )));
        }

        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        SaleWorkflow::ensure_editable(sale.status, "add item to")?;

        let item = tx
            .find_item(input.item_id)
            .await?
            .ok_or_else(|| CoreError::not_found("item", input.item_id))?;
        if !item.is_active {
            return Err(CoreError::Validation(format!("item {} is inactive", item.name)));
        }
        if sale.item_line(item.id).is_some() {
            return Err(CoreError::Validation(format!(
                "{} is already on sale {}",
                item.name, sale.sale_number
            )));
        }
        let unit_price = input
            .unit_price
            .or(item.selling_price)
            .ok_or_else(|| CoreError::Validation(format!("no price given for {}", item.name)))?;
        if !unit_price.is_positive() {
            return Err(CoreError::Validation("unit price must be positive".into()));
        }
        ensure_currency(sale.currency, unit_price)?;
        if !item.can_supply(input.quantity) {
            return Err(CoreError::InsufficientStock(vec![StockShortage {
                item_id: item.id,
                item_name: item.name.clone(),
                requested: input.quantity,
                available: item.quantity,
            }]));
        }

        let line = SaleItem::new(sale.id, item.id, input.quantity, unit_price, input.tax_rate)?;
        tx.insert_sale_item(&line).await?;
        sale.items.push(line);
        sale.recalculate_totals()?;
        sale.updated_at = Utc::now();
        tx.update_sale(&sale).await?;

        let mut audit = AuditBatch::new();
        audit.push(sale_event(
            actor,
            AuditAction::Update,
            &sale,
            format!("Added {} x {} to sale {}", input.quantity, item.name, sale.sale_number),
        ));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(sale)
    }

    /// Removes a line from a DRAFT sale.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the line is not on the sale.
    pub async fn remove_item(&self, sale_id: SaleId, line_id: SaleItemId, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        SaleWorkflow::ensure_editable(sale.status, "remove item from")?;

        let position = sale
            .items
            .iter()
            .position(|line| line.id == line_id)
            .ok_or_else(|| CoreError::not_found("sale_item", line_id))?;
        tx.delete_sale_item(line_id).await?;
        sale.items.remove(position);

        sale.recalculate_totals()?;
        let gross = sale.totals.total_amount.add(&sale.totals.tax_amount)?;
        if !sale.totals.discount_amount.is_zero() && sale.totals.discount_amount.amount() >= gross.amount() {
            warn!(sale_id = %sale.id, "discount no longer fits the sale, cleared");
            sale.totals.discount_amount = Money::zero(sale.currency);
            sale.recalculate_totals()?;
        }
        sale.updated_at = Utc::now();
        tx.update_sale(&sale).await?;

        let mut audit = AuditBatch::new();
        audit.push(sale_event(
            actor,
            AuditAction::Update,
            &sale,
            format!("Removed a line from sale {}", sale.sale_number),
        ));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(sale)
    }

    /// Sets the sale-level discount of a DRAFT sale.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a negative discount or one that
    /// would leave nothing to pay.
    pub async fn set_discount(&self, sale_id: SaleId, discount: Money, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        if discount.is_negative() {
            return Err(CoreError::Validation("discount cannot be negative".into()));
        }

        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        SaleWorkflow::ensure_editable(sale.status, "discount")?;
        ensure_currency(sale.currency, discount)?;

        let gross = sale.totals.total_amount.add(&sale.totals.tax_amount)?;
        if !discount.is_zero() && discount.amount() >= gross.amount() {
            return Err(CoreError::Validation(format!(
                "discount {discount} must be below the gross amount {gross}"
            )));
        }
        sale.totals.discount_amount = discount;
        sale.recalculate_totals()?;
        sale.updated_at = Utc::now();
        tx.update_sale(&sale).await?;

        let mut audit = AuditBatch::new();
        audit.push(sale_event(
            actor,
            AuditAction::Update,
            &sale,
            format!("Discount of {discount} on sale {}", sale.sale_number),
        ));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(sale)
    }

    // ========== Lifecycle ==========

    /// DRAFT → PENDING.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] unless DRAFT and
    /// [`CoreError::EmptySale`] without items.
    pub async fn submit(&self, sale_id: SaleId, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        let next = SaleWorkflow::submit(sale.status)?;
        if sale.items.is_empty() {
            return Err(CoreError::EmptySale(sale.id));
        }

        let previous = sale.status;
        sale.status = next;
        sale.updated_at = Utc::now();
        tx.update_sale(&sale).await?;
        self.commit_transition(tx, actor, &sale, previous, AuditAction::Update).await?;
        Ok(sale)
    }

    /// DRAFT or PENDING → APPROVED.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] from other states and
    /// [`CoreError::EmptySale`] without items.
    pub async fn approve(&self, sale_id: SaleId, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        let next = SaleWorkflow::approve(sale.status)?;
        if sale.items.is_empty() {
            return Err(CoreError::EmptySale(sale.id));
        }

        let now = Utc::now();
        let previous = sale.status;
        sale.status = next;
        sale.approved_by = Some(actor.id);
        sale.approved_at = Some(now);
        sale.updated_at = now;
        tx.update_sale(&sale).await?;
        self.commit_transition(tx, actor, &sale, previous, AuditAction::Approve).await?;
        Ok(sale)
    }

    /// APPROVED → STOCK_OUT_PENDING, creating one pending stock-out with a
    /// line per sale item.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] unless APPROVED,
    /// [`CoreError::StockOutAlreadyExists`] if a live stock-out is linked,
    /// and [`CoreError::InsufficientStock`] listing every short line.
    pub async fn request_stock_out(&self, sale_id: SaleId, actor: &Actor) -> Result<(Sale, StockOut), CoreError> {
        actor.require(Module::Sales)?;
        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        let next = SaleWorkflow::request_stock_out(sale.status)?;

        // Status alone normally rules this out; the link is checked too.
        if let Some(existing) = sale.inventory_stock_out {
            let live = tx
                .find_stock_out(existing)
                .await?
                .is_some_and(|stock_out| stock_out.review.status != ApprovalStatus::Rejected);
            if live {
                return Err(CoreError::StockOutAlreadyExists {
                    sale_id: sale.id,
                    stock_out_id: existing,
                });
            }
        }

        let mut shortages = Vec::new();
        for line in &sale.items {
            let item = tx
                .find_item(line.item_id)
                .await?
                .ok_or_else(|| CoreError::not_found("item", line.item_id))?;
            if !item.can_supply(line.quantity) {
                shortages.push(StockShortage {
                    item_id: item.id,
                    item_name: item.name,
                    requested: line.quantity,
                    available: item.quantity,
                });
            }
        }
        if !shortages.is_empty() {
            return Err(CoreError::InsufficientStock(shortages));
        }

        let issued_to = tx.find_customer(sale.customer_id).await?.map(|customer| customer.name);
        let stock_out = insert_stock_out(
            &mut tx,
            NewStockOut {
                lines: sale
                    .items
                    .iter()
                    .map(|line| StockOutLineInput {
                        item_id: line.item_id,
                        quantity: line.quantity,
                    })
                    .collect(),
                purpose: StockOutPurpose::Sale,
                linked_sale: Some(sale.id),
                issued_to,
                reference: Some(sale.sale_number.clone()),
                notes: None,
            },
            actor.id,
        )
        .await?;

        let now = Utc::now();
        let previous = sale.status;
        sale.status = next;
        sale.inventory_stock_out = Some(stock_out.id);
        sale.is_stock_out_requested = true;
        sale.stock_out_request_date = Some(now);
        sale.updated_at = now;
        tx.update_sale(&sale).await?;

        let mut audit = AuditBatch::new();
        audit.push(stock_out_created_event(actor, &stock_out));
        audit.push(sale_event(
            actor,
            AuditAction::Update,
            &sale,
            format!("{previous} -> {}: stock out {} requested", sale.status, stock_out.id),
        ));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(sale_id = %sale.id, stock_out_id = %stock_out.id, "sale stock out requested");
        Ok((sale, stock_out))
    }

    /// Records a payment and flags the sale's income paid once settled.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a non-positive amount,
    /// [`CoreError::InvalidTransition`] for DRAFT or CANCELLED sales, and
    /// [`CoreError::ExceedsBalance`] for an overpayment.
    pub async fn record_payment(&self, sale_id: SaleId, input: NewPayment, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        if !input.amount.is_positive() {
            return Err(CoreError::Validation("payment amount must be positive".into()));
        }

        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        SaleWorkflow::ensure_accepts_payment(sale.status)?;
        ensure_currency(sale.currency, input.amount)?;
        if input.amount.exceeds(&sale.totals.balance_due) {
            return Err(CoreError::ExceedsBalance {
                amount: input.amount,
                balance_due: sale.totals.balance_due,
            });
        }

        let now = Utc::now();
        let payment = Payment {
            id: PaymentId::new(),
            sale_id: sale.id,
            amount: input.amount,
            method: input.method,
            reference_number: input.reference_number,
            notes: input.notes,
            payment_date: now,
            received_by: actor.id,
        };
        tx.insert_payment(&payment).await?;
        sale.payments.push(payment);

        let was_paid = sale.totals.is_paid;
        sale.recalculate_totals()?;
        sale.updated_at = now;
        tx.update_sale(&sale).await?;
        if sale.totals.is_paid && !was_paid {
            mark_income_paid(&mut tx, &sale).await?;
        }

        let mut audit = AuditBatch::new();
        audit.push(sale_event(
            actor,
            AuditAction::Update,
            &sale,
            format!(
                "Payment of {} on sale {}, balance due {}",
                input.amount, sale.sale_number, sale.totals.balance_due
            ),
        ));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(
            sale_id = %sale.id,
            amount = %input.amount,
            balance_due = %sale.totals.balance_due,
            is_paid = sale.totals.is_paid,
            "payment recorded"
        );
        Ok(sale)
    }

    /// Cancels a non-terminal sale, voiding a pending stock-out.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] for COMPLETED or CANCELLED
    /// sales and [`CoreError::HasApprovedStockOut`] once stock has left.
    pub async fn cancel(&self, sale_id: SaleId, reason: Option<&str>, actor: &Actor) -> Result<Sale, CoreError> {
        actor.require(Module::Sales)?;
        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let mut sale = load_sale_for_update(&mut tx, sale_id).await?;
        let next = SaleWorkflow::cancel(sale.status)?;

        if let Some(stock_out_id) = sale.inventory_stock_out {
            if let Some(stock_out) = tx.find_stock_out_for_update(stock_out_id).await? {
                match stock_out.review.status {
                    ApprovalStatus::Approved => {
                        return Err(CoreError::HasApprovedStockOut {
                            sale_id: sale.id,
                            stock_out_id,
                        });
                    }
                    ApprovalStatus::Pending => {
                        tx.delete_stock_out(stock_out_id).await?;
                        info!(sale_id = %sale.id, stock_out_id = %stock_out_id, "pending stock out voided");
                    }
                    ApprovalStatus::Rejected => {}
                }
            }
        }

        let previous = sale.status;
        sale.status = next;
        sale.inventory_stock_out = None;
        sale.is_stock_out_requested = false;
        sale.updated_at = Utc::now();
        tx.update_sale(&sale).await?;

        let mut audit = AuditBatch::new();
        let reason = reason.map(str::trim).filter(|reason| !reason.is_empty());
        audit.push(sale_event(
            actor,
            AuditAction::Cancel,
            &sale,
            match reason {
                Some(reason) => format!("{previous} -> CANCELLED: {reason}"),
                None => format!("{previous} -> CANCELLED"),
            },
        ));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(sale_id = %sale.id, from = %previous, "sale cancelled");
        Ok(sale)
    }

    async fn commit_transition(
        &self,
        tx: S::Tx,
        actor: &Actor,
        sale: &Sale,
        previous: SaleStatus,
        action: AuditAction,
    ) -> Result<(), CoreError> {
        let mut audit = AuditBatch::new();
        audit.push(sale_event(
            actor,
            action,
            sale,
            format!("{previous} -> {}", sale.status),
        ));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        info!(sale_id = %sale.id, from = %previous, to = %sale.status, "sale status changed");
        Ok(())
    }

    // ========== Reads ==========

    /// Loads a sale with its items and payments.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when missing.
    pub async fn get_sale(&self, id: SaleId) -> Result<Sale, CoreError> {
        let mut tx = self.store.begin().await?;
        tx.find_sale(id)
            .await?
            .ok_or_else(|| CoreError::not_found("sale", id))
    }

    /// One page of sale summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_sales(&self, filter: &SaleFilter, page: PageRequest) -> Result<PageResponse<SaleSummary>, CoreError> {
        let mut tx = self.store.begin().await?;
        let (sales, total) = tx.list_sales(filter, page).await?;
        Ok(PageResponse::new(sales, page, total))
    }

    /// Looks up a customer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when missing.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, CoreError> {
        let mut tx = self.store.begin().await?;
        tx.find_customer(id)
            .await?
            .ok_or_else(|| CoreError::not_found("customer", id))
    }
}

/// `SALE-YYYYMMDDHHMMSS-xxxx`.
fn sale_number(now: chrono::DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(4).collect();
    format!("SALE-{}-{suffix}", now.format("%Y%m%d%H%M%S"))
}

fn ensure_currency(expected: Currency, amount: Money) -> Result<(), CoreError> {
    if amount.currency() == expected {
        Ok(())
    } else {
        Err(MoneyError::CurrencyMismatch {
            left: expected,
            right: amount.currency(),
        }
        .into())
    }
}

async fn load_sale_for_update<T: SaleRepository>(tx: &mut T, id: SaleId) -> Result<Sale, CoreError> {
    tx.find_sale_for_update(id)
        .await?
        .ok_or_else(|| CoreError::not_found("sale", id))
}

fn sale_event(actor: &Actor, action: AuditAction, sale: &Sale, description: String) -> AuditEvent {
    AuditEvent::new(actor, action, Module::Sales, "sale", sale.id, description).with_after(&sale.summary())
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sale_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap();
        let number = sale_number(now);
        assert!(number.starts_with("SALE-20261014093000-"), "{number}");
        assert_eq!(number.len(), "SALE-20261014093000-".len() + 4);
    }
}
