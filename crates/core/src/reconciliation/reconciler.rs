//! Sale reconciliation on stock-out decisions.
//!
//! Approval of a sale's stock-out completes the sale and recognizes its
//! income exactly once. Both entry points (the inventory hook and
//! [`Reconciler::reconcile_stock_out`]) run the same steps inside one unit
//! of work while the sale's lock is held, so repeated or concurrent
//! triggers observe the first one's result and do nothing.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use simba_shared::LedgerConfig;
use simba_shared::types::{SaleId, StockOutId};
use tracing::{debug, error, info, warn};

use crate::access::{Actor, Module};
use crate::audit::{AuditAction, AuditBatch, AuditEvent, AuditSink};
use crate::error::CoreError;
use crate::inventory::{ApprovalStatus, StockOut, StockOutHook};
use crate::ledger::{Income, Transaction, record_sale_income};
use crate::locks::SaleLocks;
use crate::sales::{SaleStatus, SaleWorkflow};
use crate::store::{LedgerRepository, SaleRepository, StockRepository, Store, StoreTx};

/// What a reconciliation run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The sale was already completed; nothing changed.
    AlreadyCompleted,
    /// The sale was completed; an income already existed and was kept.
    IncomeExisted {
        /// The existing income.
        income: Income,
    },
    /// The sale was completed and its income recognized.
    Reconciled {
        /// The new income.
        income: Income,
        /// The balancing cash/revenue transaction.
        transaction: Transaction,
    },
}

/// Completes sales whose stock-out was approved and reverts those whose
/// stock-out was rejected.
#[derive(Clone)]
pub struct Reconciler<S: Store> {
    store: S,
    locks: Arc<SaleLocks>,
    config: LedgerConfig,
    audit: Arc<dyn AuditSink>,
}

impl<S: Store> Reconciler<S> {
    /// Creates a reconciler sharing `locks` with the sales and inventory services.
    pub fn new(store: S, locks: Arc<SaleLocks>, config: LedgerConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            locks,
            config,
            audit,
        }
    }

    /// Re-runs reconciliation for an approved stock-out in its own unit of
    /// work. A no-op once the sale is completed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the stock-out fulfils no sale,
    /// [`CoreError::InvalidTransition`] unless it is approved, and
    /// [`CoreError::ConsistencyViolation`] if the sale is in an unexpected state.
    pub async fn reconcile_stock_out(&self, id: StockOutId, actor: &Actor) -> Result<ReconcileOutcome, CoreError> {
        actor.require(Module::Sales)?;

        let sale_id = {
            let mut peek = self.store.begin().await?;
            let stock_out = peek
                .find_stock_out(id)
                .await?
                .ok_or_else(|| CoreError::not_found("stock_out", id))?;
            stock_out.reconciles_sale().ok_or_else(|| {
                CoreError::Validation(format!("stock out {id} does not fulfil a sale"))
            })?
        };

        let _guard = self.locks.acquire(sale_id).await;
        let mut tx = self.store.begin().await?;
        let stock_out = tx
            .find_stock_out_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_out", id))?;
        if stock_out.review.status != ApprovalStatus::Approved {
            return Err(CoreError::InvalidTransition {
                entity: "stock_out",
                status: stock_out.review.status.to_string(),
                action: "reconcile",
            });
        }

        let mut audit = AuditBatch::new();
        let outcome = apply_approved(&mut tx, &stock_out, &self.config, actor, &mut audit).await?;
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(outcome)
    }
}

impl<S: Store> StockOutHook for Reconciler<S> {
    async fn stock_out_approved<T: StoreTx>(
        &self,
        tx: &mut T,
        stock_out: &StockOut,
        actor: &Actor,
        audit: &mut AuditBatch,
    ) -> Result<(), CoreError> {
        apply_approved(tx, stock_out, &self.config, actor, audit).await?;
        Ok(())
    }

    async fn stock_out_rejected<T: StoreTx>(
        &self,
        tx: &mut T,
        stock_out: &StockOut,
        actor: &Actor,
        audit: &mut AuditBatch,
    ) -> Result<(), CoreError> {
        apply_rejected(tx, stock_out, actor, audit).await
    }
}

/// Completes the linked sale and recognizes its income.
///
/// The caller holds the sale's lock and has checked that the stock-out is
/// approved.
pub async fn apply_approved<T>(
    tx: &mut T,
    stock_out: &StockOut,
    config: &LedgerConfig,
    actor: &Actor,
    audit: &mut AuditBatch,
) -> Result<ReconcileOutcome, CoreError>
where
    T: SaleRepository + LedgerRepository,
{
    let sale_id = stock_out
        .reconciles_sale()
        .ok_or_else(|| CoreError::Validation(format!("stock out {} does not fulfil a sale", stock_out.id)))?;

    // 1. Re-fetch the sale under its row lock
    let Some(mut sale) = tx.find_sale_for_update(sale_id).await? else {
        error!(stock_out_id = %stock_out.id, sale_id = %sale_id, "stock out links a missing sale");
        return Err(CoreError::ConsistencyViolation(format!(
            "stock out {} links missing sale {sale_id}",
            stock_out.id
        )));
    };

    // 2. Already reconciled
    if sale.status == SaleStatus::Completed {
        debug!(sale_id = %sale.id, stock_out_id = %stock_out.id, "sale already completed, nothing to do");
        return Ok(ReconcileOutcome::AlreadyCompleted);
    }
    if sale.status != SaleStatus::StockOutPending || sale.inventory_stock_out != Some(stock_out.id) {
        error!(
            sale_id = %sale.id,
            status = %sale.status,
            linked = ?sale.inventory_stock_out,
            stock_out_id = %stock_out.id,
            "approved stock out does not match its sale"
        );
        return Err(CoreError::ConsistencyViolation(format!(
            "sale {} is {} and linked to {:?}, cannot reconcile stock out {}",
            sale.sale_number, sale.status, sale.inventory_stock_out, stock_out.id
        )));
    }

    // 3. Complete the sale
    let now = Utc::now();
    let previous = sale.status;
    sale.status = SaleWorkflow::complete(sale.status)?;
    sale.stock_out_processed_date = Some(now);
    sale.updated_at = now;
    for line in &mut sale.items {
        line.is_stocked_out = true;
        line.stock_out_date = Some(now);
        tx.update_sale_item(line).await?;
    }
    tx.update_sale(&sale).await?;

    // 4. One income per sale
    if let Some(income) = tx.find_income_by_sale(sale.id).await? {
        warn!(sale_id = %sale.id, income_id = %income.id, "income already exists for sale");
        audit.push(reconciled_event(actor, &sale.sale_number, sale.id, stock_out, None));
        return Ok(ReconcileOutcome::IncomeExisted { income });
    }

    // 5. Recognize the income
    let (income, transaction) = record_sale_income(tx, &sale, config, actor.id).await?;

    // 6. Summarize
    audit.push(reconciled_event(actor, &sale.sale_number, sale.id, stock_out, Some(&income)));
    info!(
        sale_id = %sale.id,
        from = %previous,
        stock_out_id = %stock_out.id,
        income_id = %income.id,
        transaction_id = %transaction.id,
        "sale reconciled"
    );
    Ok(ReconcileOutcome::Reconciled { income, transaction })
}

/// Returns the linked sale to APPROVED so stock-out can be requested again.
pub async fn apply_rejected<T: SaleRepository>(
    tx: &mut T,
    stock_out: &StockOut,
    actor: &Actor,
    audit: &mut AuditBatch,
) -> Result<(), CoreError> {
    let Some(sale_id) = stock_out.reconciles_sale() else {
        return Ok(());
    };
    let Some(mut sale) = tx.find_sale_for_update(sale_id).await? else {
        warn!(stock_out_id = %stock_out.id, sale_id = %sale_id, "rejected stock out links a missing sale");
        return Ok(());
    };
    if sale.status != SaleStatus::StockOutPending || sale.inventory_stock_out != Some(stock_out.id) {
        warn!(
            sale_id = %sale.id,
            status = %sale.status,
            stock_out_id = %stock_out.id,
            "rejected stock out no longer drives its sale"
        );
        return Ok(());
    }

    let previous = sale.status;
    sale.status = SaleWorkflow::stock_out_rejected(sale.status)?;
    sale.inventory_stock_out = None;
    sale.is_stock_out_requested = false;
    sale.stock_out_request_date = None;
    sale.updated_at = Utc::now();
    tx.update_sale(&sale).await?;

    let reason = stock_out.review.rejection_reason.as_deref().unwrap_or("no reason given");
    audit.push(
        AuditEvent::new(
            actor,
            AuditAction::Update,
            Module::Sales,
            "sale",
            sale.id,
            format!("{previous} -> {}: stock out {} rejected ({reason})", sale.status, stock_out.id),
        )
        .with_after(&sale.summary()),
    );
    info!(sale_id = %sale.id, stock_out_id = %stock_out.id, "sale returned to approved");
    Ok(())
}

fn reconciled_event(
    actor: &Actor,
    sale_number: &str,
    sale_id: SaleId,
    stock_out: &StockOut,
    income: Option<&Income>,
) -> AuditEvent {
    let description = match income {
        Some(income) => format!(
            "Sale {sale_number} completed by stock out {}; income {} of {} recognized",
            stock_out.id, income.id, income.amount
        ),
        None => format!(
            "Sale {sale_number} completed by stock out {}; existing income kept",
            stock_out.id
        ),
    };
    AuditEvent::new(actor, AuditAction::Update, Module::Sales, "sale", sale_id, description)
}
