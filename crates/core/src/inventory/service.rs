//! Inventory service: items, receipts, adjustments, and stock-outs.
//!
//! Stock levels change only when a receipt, adjustment, or stock-out is
//! approved. Every change locks the affected items, writes one history row
//! per item, and commits with the approval.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use simba_shared::InventoryConfig;
use simba_shared::types::pagination::MAX_PER_PAGE;
use simba_shared::types::{
    ItemId, Money, PageRequest, PageResponse, Quantity, SaleId, StockAdjustmentId, StockHistoryId,
    StockInId, StockOutId, StockOutLineId, UserId,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::hook::StockOutHook;
use super::naming::{normalize_item_name, normalize_sku};
use super::types::{
    AdjustmentType, Item, ItemCategory, Review, StockAdjustment, StockHistory, StockIn,
    StockInSource, StockMovement, StockOut, StockOutLine, StockOutPurpose, StockShortage,
    StockStatus,
};
use crate::access::{Actor, Module};
use crate::audit::{AuditAction, AuditBatch, AuditEvent, AuditSink};
use crate::error::CoreError;
use crate::locks::{SaleGuard, SaleLocks};
use crate::store::{ItemFilter, ItemRepository, StockRepository, Store, StoreTx};

/// Input for [`InventoryService::create_item`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    /// Raw name; normalized before storing.
    pub name: String,
    /// Optional SKU.
    pub sku: Option<String>,
    /// Category, `Others` when omitted.
    pub category: Option<ItemCategory>,
    /// Unit of measure, configured default when omitted.
    pub unit_of_measure: Option<String>,
    /// Low-stock threshold, configured default when omitted.
    pub reorder_level: Option<Quantity>,
    /// Critical-stock threshold, configured default when omitted.
    pub minimum_stock: Option<Quantity>,
    /// Default selling price.
    pub selling_price: Option<Money>,
}

/// Input for [`InventoryService::record_stock_in`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewStockIn {
    /// Receiving item.
    pub item_id: ItemId,
    /// Received quantity.
    pub quantity: Quantity,
    /// Origin of the stock.
    pub source: StockInSource,
    /// Supplier name.
    pub supplier: Option<String>,
    /// Delivery reference.
    pub reference: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Approve immediately (receiving desk flow).
    #[serde(default)]
    pub auto_approve: bool,
}

/// Input for [`InventoryService::request_adjustment`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAdjustment {
    /// Adjusted item.
    pub item_id: ItemId,
    /// Signed delta.
    pub adjustment_quantity: Quantity,
    /// Kind of correction.
    pub adjustment_type: AdjustmentType,
    /// Justification.
    pub reason: String,
}

/// One requested line of a stock-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StockOutLineInput {
    /// Item to deduct from.
    pub item_id: ItemId,
    /// Quantity to deduct.
    pub quantity: Quantity,
}

/// Input for [`InventoryService::create_stock_out_lines`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewStockOut {
    /// One or more lines.
    pub lines: Vec<StockOutLineInput>,
    /// Why the stock leaves.
    pub purpose: StockOutPurpose,
    /// Sale this request fulfils.
    pub linked_sale: Option<SaleId>,
    /// Recipient.
    pub issued_to: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

/// Inventory operations. Mutations require the [`Module::Inventory`] capability.
pub struct InventoryService<S: Store, H: StockOutHook> {
    store: S,
    hook: H,
    locks: Arc<SaleLocks>,
    audit: Arc<dyn AuditSink>,
    config: InventoryConfig,
}

impl<S: Store, H: StockOutHook> InventoryService<S, H> {
    /// Creates a service that calls `hook` for sale-linked stock-outs.
    pub fn new(
        store: S,
        hook: H,
        locks: Arc<SaleLocks>,
        config: InventoryConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            hook,
            locks,
            audit,
            config,
        }
    }

    // ========== Items ==========

    /// Creates an item with zero stock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Duplicate`] if an active item has the same
    /// normalized name or any item has the same SKU.
    pub async fn create_item(&self, input: NewItem, actor: &Actor) -> Result<Item, CoreError> {
        actor.require(Module::Inventory)?;

        let name = normalize_item_name(&input.name);
        if name.is_empty() {
            return Err(CoreError::Validation("item name is required".into()));
        }
        let sku = normalize_sku(input.sku.as_deref());
        let reorder_level = input.reorder_level.unwrap_or(self.config.default_reorder_level);
        let minimum_stock = input.minimum_stock.unwrap_or(self.config.default_minimum_stock);
        if reorder_level.is_negative() || minimum_stock.is_negative() {
            return Err(CoreError::Validation("stock levels cannot be negative".into()));
        }
        ensure_storable("reorder level", reorder_level)?;
        ensure_storable("minimum stock", minimum_stock)?;
        if minimum_stock > reorder_level {
            return Err(CoreError::Validation(format!(
                "minimum stock {minimum_stock} exceeds reorder level {reorder_level}"
            )));
        }
        if input.selling_price.is_some_and(|price| !price.is_positive()) {
            return Err(CoreError::Validation("selling price must be positive".into()));
        }

        let mut tx = self.store.begin().await?;
        if tx.find_active_item_by_name(&name).await?.is_some() {
            return Err(CoreError::Duplicate { entity: "item", key: name });
        }
        if let Some(sku) = &sku {
            if tx.find_item_by_sku(sku).await?.is_some() {
                return Err(CoreError::Duplicate {
                    entity: "item",
                    key: sku.clone(),
                });
            }
        }

        let now = Utc::now();
        let item = Item {
            id: ItemId::new(),
            name,
            sku,
            category: input.category.unwrap_or(ItemCategory::Others),
            unit_of_measure: input
                .unit_of_measure
                .map(|unit| unit.trim().to_string())
                .filter(|unit| !unit.is_empty())
                .unwrap_or_else(|| self.config.default_unit_of_measure.clone()),
            quantity: Quantity::ZERO,
            reorder_level,
            minimum_stock,
            selling_price: input.selling_price,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tx.insert_item(&item).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Create,
                Module::Inventory,
                "item",
                item.id,
                format!("Created item {}", item.name),
            )
            .with_after(&item),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(item_id = %item.id, name = %item.name, "item created");
        Ok(item)
    }

    // ========== Stock In ==========

    /// Records a receipt, approving it immediately when `auto_approve` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a non-positive quantity or an
    /// inactive item.
    pub async fn record_stock_in(&self, input: NewStockIn, actor: &Actor) -> Result<StockIn, CoreError> {
        actor.require(Module::Inventory)?;
        if !input.quantity.is_positive() {
            return Err(CoreError::Validation("received quantity must be positive".into()));
        }
        ensure_storable("received quantity", input.quantity)?;

        let mut tx = self.store.begin().await?;
        let now = Utc::now();
        let stock_in = StockIn {
            id: StockInId::new(),
            item_id: input.item_id,
            quantity: input.quantity,
            source: input.source,
            supplier: input.supplier,
            reference: input.reference,
            notes: input.notes,
            review: if input.auto_approve {
                Review::approved(actor.id, now)
            } else {
                Review::pending()
            },
            created_by: actor.id,
            created_at: now,
        };

        let mut item = lock_item(&mut tx, stock_in.item_id).await?;
        if !item.is_active {
            return Err(CoreError::Validation(format!("item {} is inactive", item.name)));
        }
        tx.insert_stock_in(&stock_in).await?;
        if input.auto_approve {
            apply_movement(
                &mut tx,
                &mut item,
                stock_in.quantity,
                StockMovement::StockIn,
                stock_in.id.into_inner(),
                stock_in.reference.clone(),
                actor.id,
            )
            .await?;
        }

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                if input.auto_approve { AuditAction::Approve } else { AuditAction::Create },
                Module::Inventory,
                "stock_in",
                stock_in.id,
                format!("Stock in of {} for {}", stock_in.quantity, item.name),
            )
            .with_after(&stock_in),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(
            stock_in_id = %stock_in.id,
            item_id = %item.id,
            quantity = %stock_in.quantity,
            status = %stock_in.review.status,
            "stock in recorded"
        );
        Ok(stock_in)
    }

    /// Approves a pending receipt and adds its quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyProcessed`] if it is not pending.
    pub async fn approve_stock_in(&self, id: StockInId, actor: &Actor) -> Result<StockIn, CoreError> {
        actor.require(Module::Inventory)?;
        let mut tx = self.store.begin().await?;
        let mut stock_in = tx
            .find_stock_in_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_in", id))?;
        stock_in
            .review
            .approve("stock_in", id.into_inner(), actor.id, Utc::now())?;

        let mut item = lock_item(&mut tx, stock_in.item_id).await?;
        let entry = apply_movement(
            &mut tx,
            &mut item,
            stock_in.quantity,
            StockMovement::StockIn,
            id.into_inner(),
            stock_in.reference.clone(),
            actor.id,
        )
        .await?;
        tx.update_stock_in(&stock_in).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Approve,
                Module::Inventory,
                "stock_in",
                id,
                format!(
                    "Approved stock in of {} for {}: {} -> {}",
                    stock_in.quantity, item.name, entry.previous_quantity, entry.new_quantity
                ),
            )
            .with_after(&stock_in),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(stock_in_id = %id, item_id = %item.id, new_quantity = %item.quantity, "stock in approved");
        Ok(stock_in)
    }

    /// Rejects a pending receipt.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyProcessed`] if it is not pending.
    pub async fn reject_stock_in(
        &self,
        id: StockInId,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<StockIn, CoreError> {
        actor.require(Module::Inventory)?;
        let mut tx = self.store.begin().await?;
        let mut stock_in = tx
            .find_stock_in_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_in", id))?;
        stock_in
            .review
            .reject("stock_in", id.into_inner(), actor.id, Utc::now(), trimmed(reason))?;
        tx.update_stock_in(&stock_in).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Reject,
                Module::Inventory,
                "stock_in",
                id,
                "Rejected stock in",
            )
            .with_after(&stock_in),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(stock_in)
    }

    // ========== Adjustments ==========

    /// Requests a signed stock correction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a zero delta or a missing reason.
    pub async fn request_adjustment(
        &self,
        input: NewAdjustment,
        actor: &Actor,
    ) -> Result<StockAdjustment, CoreError> {
        actor.require(Module::Inventory)?;
        if input.adjustment_quantity.is_zero() {
            return Err(CoreError::Validation("adjustment quantity cannot be zero".into()));
        }
        ensure_storable("adjustment quantity", input.adjustment_quantity)?;
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(CoreError::Validation("an adjustment reason is required".into()));
        }

        let mut tx = self.store.begin().await?;
        let item = tx
            .find_item(input.item_id)
            .await?
            .ok_or_else(|| CoreError::not_found("item", input.item_id))?;
        let adjustment = StockAdjustment {
            id: StockAdjustmentId::new(),
            item_id: item.id,
            adjustment_quantity: input.adjustment_quantity,
            adjustment_type: input.adjustment_type,
            reason: reason.to_string(),
            review: Review::pending(),
            created_by: actor.id,
            created_at: Utc::now(),
        };
        tx.insert_adjustment(&adjustment).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Create,
                Module::Inventory,
                "stock_adjustment",
                adjustment.id,
                format!("Requested adjustment of {} for {}", adjustment.adjustment_quantity, item.name),
            )
            .with_after(&adjustment),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(adjustment)
    }

    /// Approves an adjustment and applies its delta.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientStock`] if the delta would make stock
    /// negative, and [`CoreError::AlreadyProcessed`] if it is not pending.
    pub async fn approve_adjustment(
        &self,
        id: StockAdjustmentId,
        actor: &Actor,
    ) -> Result<StockAdjustment, CoreError> {
        actor.require(Module::Inventory)?;
        let mut tx = self.store.begin().await?;
        let mut adjustment = tx
            .find_adjustment_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_adjustment", id))?;
        adjustment
            .review
            .approve("stock_adjustment", id.into_inner(), actor.id, Utc::now())?;

        let mut item = lock_item(&mut tx, adjustment.item_id).await?;
        let entry = apply_movement(
            &mut tx,
            &mut item,
            adjustment.adjustment_quantity,
            StockMovement::Adjustment,
            id.into_inner(),
            Some(adjustment.reason.clone()),
            actor.id,
        )
        .await?;
        tx.update_adjustment(&adjustment).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Approve,
                Module::Inventory,
                "stock_adjustment",
                id,
                format!(
                    "Approved adjustment for {}: {} -> {}",
                    item.name, entry.previous_quantity, entry.new_quantity
                ),
            )
            .with_after(&adjustment),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(adjustment_id = %id, item_id = %item.id, new_quantity = %item.quantity, "adjustment approved");
        Ok(adjustment)
    }

    /// Rejects an adjustment. Stock is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] without a reason and
    /// [`CoreError::AlreadyProcessed`] if it is not pending.
    pub async fn reject_adjustment(
        &self,
        id: StockAdjustmentId,
        reason: &str,
        actor: &Actor,
    ) -> Result<StockAdjustment, CoreError> {
        actor.require(Module::Inventory)?;
        let reason = required_reason(reason)?;
        let mut tx = self.store.begin().await?;
        let mut adjustment = tx
            .find_adjustment_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_adjustment", id))?;
        adjustment.review.reject(
            "stock_adjustment",
            id.into_inner(),
            actor.id,
            Utc::now(),
            Some(reason.clone()),
        )?;
        tx.update_adjustment(&adjustment).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Reject,
                Module::Inventory,
                "stock_adjustment",
                id,
                format!("Rejected adjustment: {reason}"),
            )
            .with_after(&adjustment),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(adjustment)
    }

    // ========== Stock Out ==========

    /// Creates a pending single-item stock-out. Stock is not checked or
    /// deducted until approval.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a non-positive quantity.
    pub async fn create_stock_out(
        &self,
        item_id: ItemId,
        quantity: Quantity,
        purpose: StockOutPurpose,
        linked_sale: Option<SaleId>,
        actor: &Actor,
    ) -> Result<StockOut, CoreError> {
        self.create_stock_out_lines(
            NewStockOut {
                lines: vec![StockOutLineInput { item_id, quantity }],
                purpose,
                linked_sale,
                issued_to: None,
                reference: None,
                notes: None,
            },
            actor,
        )
        .await
    }

    /// Creates a pending multi-line stock-out.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for an empty request or a
    /// non-positive line, [`CoreError::NotFound`] for an unknown item.
    pub async fn create_stock_out_lines(&self, input: NewStockOut, actor: &Actor) -> Result<StockOut, CoreError> {
        actor.require(Module::Inventory)?;
        let mut tx = self.store.begin().await?;
        let stock_out = insert_stock_out(&mut tx, input, actor.id).await?;

        let mut audit = AuditBatch::new();
        audit.push(stock_out_created_event(actor, &stock_out));
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(stock_out)
    }

    /// Approves a pending stock-out: deducts every line exactly once and,
    /// for sale stock-outs, reconciles the sale in the same unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyProcessed`] if it is not pending and
    /// [`CoreError::InsufficientStock`] listing every short line. On any
    /// error nothing is persisted.
    pub async fn approve_stock_out(&self, id: StockOutId, actor: &Actor) -> Result<StockOut, CoreError> {
        actor.require(Module::Inventory)?;
        let _sale_guard = self.lock_linked_sale(id).await?;

        let mut tx = self.store.begin().await?;
        let mut stock_out = tx
            .find_stock_out_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_out", id))?;
        let before = stock_out.clone();
        let now = Utc::now();
        stock_out
            .review
            .approve("stock_out", id.into_inner(), actor.id, now)?;

        // Lock every item in id order, then check all lines before touching any.
        let item_ids = stock_out.item_ids();
        let mut items: HashMap<ItemId, Item> = tx
            .find_items_for_update(&item_ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut shortages = Vec::new();
        let mut deductions = Vec::with_capacity(item_ids.len());
        for item_id in &item_ids {
            let item = items
                .get(item_id)
                .ok_or_else(|| CoreError::not_found("item", item_id))?;
            let requested = stock_out.quantity_for(*item_id).ok_or_else(|| {
                CoreError::Validation(format!("requested quantity of {} is out of range", item.name))
            })?;
            deductions.push((*item_id, requested));
            if !item.can_supply(requested) {
                shortages.push(StockShortage {
                    item_id: *item_id,
                    item_name: item.name.clone(),
                    requested,
                    available: item.quantity,
                });
            }
        }
        if !shortages.is_empty() {
            warn!(stock_out_id = %id, shortages = shortages.len(), "stock out refused");
            return Err(CoreError::InsufficientStock(shortages));
        }

        for (item_id, requested) in deductions {
            if let Some(item) = items.get_mut(&item_id) {
                apply_movement(
                    &mut tx,
                    item,
                    -requested,
                    StockMovement::StockOut,
                    id.into_inner(),
                    stock_out.reference.clone(),
                    actor.id,
                )
                .await?;
            }
        }
        tx.update_stock_out(&stock_out).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Approve,
                Module::Inventory,
                "stock_out",
                id,
                format!("Approved stock out of {} line(s)", stock_out.lines.len()),
            )
            .with_before(&before)
            .with_after(&stock_out),
        );

        if stock_out.reconciles_sale().is_some() {
            self.hook
                .stock_out_approved(&mut tx, &stock_out, actor, &mut audit)
                .await?;
        }

        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(
            stock_out_id = %id,
            approved_by = %actor.id,
            lines = stock_out.lines.len(),
            linked_sale = ?stock_out.linked_sale,
            "stock out approved"
        );
        Ok(stock_out)
    }

    /// Rejects a pending stock-out. Stock is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] without a reason and
    /// [`CoreError::AlreadyProcessed`] if it is not pending.
    pub async fn reject_stock_out(
        &self,
        id: StockOutId,
        reason: &str,
        actor: &Actor,
    ) -> Result<StockOut, CoreError> {
        actor.require(Module::Inventory)?;
        let reason = required_reason(reason)?;
        let _sale_guard = self.lock_linked_sale(id).await?;

        let mut tx = self.store.begin().await?;
        let mut stock_out = tx
            .find_stock_out_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_out", id))?;
        stock_out.review.reject(
            "stock_out",
            id.into_inner(),
            actor.id,
            Utc::now(),
            Some(reason.clone()),
        )?;
        tx.update_stock_out(&stock_out).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Reject,
                Module::Inventory,
                "stock_out",
                id,
                format!("Rejected stock out: {reason}"),
            )
            .with_after(&stock_out),
        );

        if stock_out.reconciles_sale().is_some() {
            self.hook
                .stock_out_rejected(&mut tx, &stock_out, actor, &mut audit)
                .await?;
        }

        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(stock_out_id = %id, rejected_by = %actor.id, "stock out rejected");
        Ok(stock_out)
    }

    /// Takes the lock of the sale a stock-out is linked to, if any.
    async fn lock_linked_sale(&self, id: StockOutId) -> Result<Option<SaleGuard<'_>>, CoreError> {
        let linked_sale = {
            let mut peek = self.store.begin().await?;
            peek.find_stock_out(id)
                .await?
                .ok_or_else(|| CoreError::not_found("stock_out", id))?
                .linked_sale
        };
        Ok(match linked_sale {
            Some(sale) => Some(self.locks.acquire(sale).await),
            None => None,
        })
    }

    // ========== Reads ==========

    /// Looks up one item.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when missing.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, CoreError> {
        let mut tx = self.store.begin().await?;
        tx.find_item(id)
            .await?
            .ok_or_else(|| CoreError::not_found("item", id))
    }

    /// One page of items, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_items(&self, filter: &ItemFilter, page: PageRequest) -> Result<PageResponse<Item>, CoreError> {
        let mut tx = self.store.begin().await?;
        let (items, total) = tx.list_items(filter, page).await?;
        Ok(PageResponse::new(items, page, total))
    }

    /// Stock movements of one item, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown item.
    pub async fn item_history(&self, id: ItemId) -> Result<Vec<StockHistory>, CoreError> {
        let mut tx = self.store.begin().await?;
        if tx.find_item(id).await?.is_none() {
            return Err(CoreError::not_found("item", id));
        }
        Ok(tx.list_stock_history(id).await?)
    }

    /// Active items at or below their reorder level.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn low_stock_items(&self) -> Result<Vec<Item>, CoreError> {
        let mut tx = self.store.begin().await?;
        let filter = ItemFilter::default();
        let mut low = Vec::new();
        let mut page = PageRequest::new(1, MAX_PER_PAGE);
        loop {
            let (items, total) = tx.list_items(&filter, page).await?;
            let fetched = page.offset() + items.len() as u64;
            let last_page = items.is_empty() || fetched >= total;
            low.extend(items.into_iter().filter(|item| item.stock_status() != StockStatus::Good));
            if last_page {
                break;
            }
            page = PageRequest::new(page.page + 1, page.per_page);
        }
        Ok(low)
    }

    /// Looks up one stock-out with its lines.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when missing.
    pub async fn get_stock_out(&self, id: StockOutId) -> Result<StockOut, CoreError> {
        let mut tx = self.store.begin().await?;
        tx.find_stock_out(id)
            .await?
            .ok_or_else(|| CoreError::not_found("stock_out", id))
    }
}

fn trimmed(reason: Option<String>) -> Option<String> {
    reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty())
}

fn required_reason(reason: &str) -> Result<String, CoreError> {
    trimmed(Some(reason.to_string()))
        .ok_or_else(|| CoreError::Validation("a rejection reason is required".into()))
}

async fn lock_item<T: ItemRepository>(tx: &mut T, id: ItemId) -> Result<Item, CoreError> {
    tx.find_items_for_update(&[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::not_found("item", id))
}

/// Refuses quantities the stock columns cannot hold.
pub(crate) fn ensure_storable(label: &str, quantity: Quantity) -> Result<(), CoreError> {
    if quantity.is_storable() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{label} {quantity} exceeds the maximum of {}",
            Quantity::max()
        )))
    }
}

/// Applies a signed delta to a locked item and records the history row.
async fn apply_movement<T: ItemRepository>(
    tx: &mut T,
    item: &mut Item,
    delta: Quantity,
    movement: StockMovement,
    reference_id: Uuid,
    notes: Option<String>,
    created_by: UserId,
) -> Result<StockHistory, CoreError> {
    let previous_quantity = item.quantity;
    let new_quantity = previous_quantity.checked_add(delta).ok_or_else(|| {
        CoreError::Validation(format!(
            "stock of {} cannot exceed {}",
            item.name,
            Quantity::max()
        ))
    })?;
    if new_quantity.is_negative() {
        return Err(CoreError::InsufficientStock(vec![StockShortage {
            item_id: item.id,
            item_name: item.name.clone(),
            requested: delta.abs(),
            available: previous_quantity,
        }]));
    }

    let now: DateTime<Utc> = Utc::now();
    item.quantity = new_quantity;
    item.updated_at = now;
    tx.update_item(item).await?;

    let entry = StockHistory {
        id: StockHistoryId::new(),
        item_id: item.id,
        movement,
        quantity: delta,
        previous_quantity,
        new_quantity,
        reference_id,
        notes,
        created_by,
        created_at: now,
    };
    tx.insert_stock_history(&entry).await?;
    Ok(entry)
}

/// Validates and inserts a pending stock-out inside the caller's unit of work.
pub(crate) async fn insert_stock_out<T: StoreTx>(
    tx: &mut T,
    input: NewStockOut,
    created_by: UserId,
) -> Result<StockOut, CoreError> {
    if input.lines.is_empty() {
        return Err(CoreError::Validation("a stock out needs at least one line".into()));
    }
    let id = StockOutId::new();
    let mut lines = Vec::with_capacity(input.lines.len());
    for line in input.lines {
        if !line.quantity.is_positive() {
            return Err(CoreError::Validation(format!(
                "stock out quantity must be positive, got {}",
                line.quantity
            )));
        }
        ensure_storable("stock out quantity", line.quantity)?;
        let item = tx
            .find_item(line.item_id)
            .await?
            .ok_or_else(|| CoreError::not_found("item", line.item_id))?;
        if !item.is_active {
            return Err(CoreError::Validation(format!("item {} is inactive", item.name)));
        }
        lines.push(StockOutLine {
            id: StockOutLineId::new(),
            stock_out_id: id,
            item_id: line.item_id,
            quantity: line.quantity,
        });
    }

    let stock_out = StockOut {
        id,
        lines,
        purpose: input.purpose,
        linked_sale: input.linked_sale,
        issued_to: input.issued_to,
        reference: input.reference,
        notes: input.notes,
        review: Review::pending(),
        created_by,
        created_at: Utc::now(),
    };
    tx.insert_stock_out(&stock_out).await?;

    info!(
        stock_out_id = %stock_out.id,
        purpose = stock_out.purpose.as_str(),
        lines = stock_out.lines.len(),
        "stock out requested"
    );
    Ok(stock_out)
}

/// Audit event for a new stock-out request.
pub(crate) fn stock_out_created_event(actor: &Actor, stock_out: &StockOut) -> AuditEvent {
    AuditEvent::new(
        actor,
        AuditAction::Create,
        Module::Inventory,
        "stock_out",
        stock_out.id,
        format!(
            "Requested stock out ({}) of {} line(s)",
            stock_out.purpose.as_str(),
            stock_out.lines.len()
        ),
    )
    .with_after(stock_out)
}
