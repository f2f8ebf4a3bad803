//! Stock ledger domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simba_shared::types::{
    ItemId, Money, Quantity, SaleId, StockAdjustmentId, StockHistoryId, StockInId, StockOutId,
    StockOutLineId, UserId,
};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Item grouping used by reports and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    /// Raw materials.
    RawMaterials,
    /// Chemicals.
    Chemicals,
    /// Finished goods.
    FinishedGoods,
    /// Anything else.
    Others,
}

impl ItemCategory {
    /// Returns the string representation of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawMaterials => "RAW_MATERIALS",
            Self::Chemicals => "CHEMICALS",
            Self::FinishedGoods => "FINISHED_GOODS",
            Self::Others => "OTHERS",
        }
    }

    /// Parses a category from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RAW_MATERIALS" => Some(Self::RawMaterials),
            "CHEMICALS" => Some(Self::Chemicals),
            "FINISHED_GOODS" => Some(Self::FinishedGoods),
            "OTHERS" => Some(Self::Others),
            _ => None,
        }
    }
}

/// Derived stock level indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// Above the reorder level.
    Good,
    /// At or below the reorder level.
    Low,
    /// At or below the minimum stock.
    Critical,
}

/// An inventory item with its current stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier.
    pub id: ItemId,
    /// Normalized display name (title-cased, single-spaced).
    pub name: String,
    /// Optional stock keeping unit, unique when present.
    pub sku: Option<String>,
    /// Item category.
    pub category: ItemCategory,
    /// Unit of measure, e.g. `"kg"`.
    pub unit_of_measure: String,
    /// Quantity on hand; never negative.
    pub quantity: Quantity,
    /// Low-stock threshold.
    pub reorder_level: Quantity,
    /// Critical-stock threshold.
    pub minimum_stock: Quantity,
    /// Default selling price.
    pub selling_price: Option<Money>,
    /// Inactive items are hidden from sales.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Stock indicator derived from the thresholds.
    #[must_use]
    pub fn stock_status(&self) -> StockStatus {
        if self.quantity <= self.minimum_stock {
            StockStatus::Critical
        } else if self.quantity <= self.reorder_level {
            StockStatus::Low
        } else {
            StockStatus::Good
        }
    }

    /// True if `requested` can be taken from current stock.
    #[must_use]
    pub fn can_supply(&self, requested: Quantity) -> bool {
        self.quantity >= requested
    }
}

/// Review state shared by stock-in, adjustment, and stock-out requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved (terminal).
    Approved,
    /// Rejected (terminal).
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who decided a request, when, and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Current status.
    pub status: ApprovalStatus,
    /// Approver or rejecter.
    pub reviewed_by: Option<UserId>,
    /// Decision time.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reason given on rejection.
    pub rejection_reason: Option<String>,
}

impl Review {
    /// A review awaiting a decision.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            status: ApprovalStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
        }
    }

    /// A review approved on creation (auto-approved receipts).
    #[must_use]
    pub const fn approved(by: UserId, at: DateTime<Utc>) -> Self {
        Self {
            status: ApprovalStatus::Approved,
            reviewed_by: Some(by),
            reviewed_at: Some(at),
            rejection_reason: None,
        }
    }

    /// Returns true while no decision has been made.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    fn ensure_pending(&self, entity: &'static str, id: Uuid) -> Result<(), CoreError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(CoreError::AlreadyProcessed {
                entity,
                id,
                status: self.status.to_string(),
            })
        }
    }

    /// Moves pending → approved.
    pub fn approve(
        &mut self,
        entity: &'static str,
        id: Uuid,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.ensure_pending(entity, id)?;
        *self = Self::approved(by, at);
        Ok(())
    }

    /// Moves pending → rejected.
    pub fn reject(
        &mut self,
        entity: &'static str,
        id: Uuid,
        by: UserId,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<(), CoreError> {
        self.ensure_pending(entity, id)?;
        *self = Self {
            status: ApprovalStatus::Rejected,
            reviewed_by: Some(by),
            reviewed_at: Some(at),
            rejection_reason: reason,
        };
        Ok(())
    }
}

/// Where received stock came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockInSource {
    /// Supplier purchase.
    Purchase,
    /// Customer return.
    Return,
    /// In-house production.
    Production,
    /// Count or correction.
    Adjustment,
    /// Anything else.
    Other,
}

impl StockInSource {
    /// Returns the string representation of the source.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Return => "RETURN",
            Self::Production => "PRODUCTION",
            Self::Adjustment => "ADJUSTMENT",
            Self::Other => "OTHER",
        }
    }

    /// Parses a source from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PURCHASE" => Some(Self::Purchase),
            "RETURN" => Some(Self::Return),
            "PRODUCTION" => Some(Self::Production),
            "ADJUSTMENT" => Some(Self::Adjustment),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A receipt of stock into an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIn {
    /// Receipt identifier.
    pub id: StockInId,
    /// Receiving item.
    pub item_id: ItemId,
    /// Received quantity (> 0).
    pub quantity: Quantity,
    /// Origin of the stock.
    pub source: StockInSource,
    /// Supplier name.
    pub supplier: Option<String>,
    /// Delivery note or invoice reference.
    pub reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Approval state.
    pub review: Review,
    /// Who recorded it.
    pub created_by: UserId,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

/// Why stock is being corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    /// Data entry correction.
    ErrorCorrection,
    /// Scale or measurement correction.
    MeasurementCorrection,
    /// Lost stock.
    Loss,
    /// Shrinkage.
    Shrinkage,
    /// Found stock.
    Gain,
    /// Physical count reconciliation.
    PhysicalCount,
    /// Anything else.
    Other,
}

impl AdjustmentType {
    /// Returns the string representation of the adjustment type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ErrorCorrection => "ERROR_CORRECTION",
            Self::MeasurementCorrection => "MEASUREMENT_CORRECTION",
            Self::Loss => "LOSS",
            Self::Shrinkage => "SHRINKAGE",
            Self::Gain => "GAIN",
            Self::PhysicalCount => "PHYSICAL_COUNT",
            Self::Other => "OTHER",
        }
    }

    /// Parses an adjustment type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ERROR_CORRECTION" => Some(Self::ErrorCorrection),
            "MEASUREMENT_CORRECTION" => Some(Self::MeasurementCorrection),
            "LOSS" => Some(Self::Loss),
            "SHRINKAGE" => Some(Self::Shrinkage),
            "GAIN" => Some(Self::Gain),
            "PHYSICAL_COUNT" => Some(Self::PhysicalCount),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A signed correction to an item's stock, applied on approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    /// Adjustment identifier.
    pub id: StockAdjustmentId,
    /// Adjusted item.
    pub item_id: ItemId,
    /// Signed, non-zero delta.
    pub adjustment_quantity: Quantity,
    /// Kind of correction.
    pub adjustment_type: AdjustmentType,
    /// Required justification.
    pub reason: String,
    /// Approval state.
    pub review: Review,
    /// Who requested it.
    pub created_by: UserId,
    /// When it was requested.
    pub created_at: DateTime<Utc>,
}

/// Why stock leaves the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockOutPurpose {
    /// Fulfils a sale; approval triggers reconciliation.
    Sale,
    /// Moved to another location.
    Transfer,
    /// Consumed internally.
    InternalUse,
    /// Written off as damaged.
    Damage,
    /// Given away as a sample.
    Sample,
    /// Returned to a supplier.
    Return,
    /// Anything else.
    Other,
}

impl StockOutPurpose {
    /// Returns the string representation of the purpose.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Transfer => "TRANSFER",
            Self::InternalUse => "INTERNAL_USE",
            Self::Damage => "DAMAGE",
            Self::Sample => "SAMPLE",
            Self::Return => "RETURN",
            Self::Other => "OTHER",
        }
    }

    /// Parses a purpose from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SALE" => Some(Self::Sale),
            "TRANSFER" => Some(Self::Transfer),
            "INTERNAL_USE" => Some(Self::InternalUse),
            "DAMAGE" => Some(Self::Damage),
            "SAMPLE" => Some(Self::Sample),
            "RETURN" => Some(Self::Return),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// One item and quantity within a stock-out request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOutLine {
    /// Line identifier.
    pub id: StockOutLineId,
    /// Owning stock-out.
    pub stock_out_id: StockOutId,
    /// Item to deduct from.
    pub item_id: ItemId,
    /// Quantity to deduct (> 0).
    pub quantity: Quantity,
}

/// A request to remove stock, deducted only when approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOut {
    /// Request identifier.
    pub id: StockOutId,
    /// One or more item lines.
    pub lines: Vec<StockOutLine>,
    /// Why the stock leaves.
    pub purpose: StockOutPurpose,
    /// Sale this request fulfils, if any. Lookup only.
    pub linked_sale: Option<SaleId>,
    /// Recipient.
    pub issued_to: Option<String>,
    /// External reference, e.g. the sale number.
    pub reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Approval state.
    pub review: Review,
    /// Requester.
    pub created_by: UserId,
    /// Request time.
    pub created_at: DateTime<Utc>,
}

impl StockOut {
    /// Total requested quantity for `item` across all lines, or `None` if
    /// the lines add up to more than a stock column holds.
    #[must_use]
    pub fn quantity_for(&self, item: ItemId) -> Option<Quantity> {
        self.lines
            .iter()
            .filter(|line| line.item_id == item)
            .try_fold(Quantity::ZERO, |acc, line| acc.checked_add(line.quantity))
    }

    /// Distinct item ids in ascending order (the row-lock order).
    #[must_use]
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.lines.iter().map(|line| line.item_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// True when approval must reconcile a sale.
    #[must_use]
    pub fn reconciles_sale(&self) -> Option<SaleId> {
        match (self.purpose, self.linked_sale) {
            (StockOutPurpose::Sale, Some(sale)) => Some(sale),
            _ => None,
        }
    }
}

/// Kind of stock movement recorded in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovement {
    /// Approved receipt.
    StockIn,
    /// Approved removal.
    StockOut,
    /// Approved correction.
    Adjustment,
}

impl StockMovement {
    /// Returns the string representation of the movement.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StockIn => "STOCK_IN",
            Self::StockOut => "STOCK_OUT",
            Self::Adjustment => "ADJUSTMENT",
        }
    }

    /// Parses a movement from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STOCK_IN" => Some(Self::StockIn),
            "STOCK_OUT" => Some(Self::StockOut),
            "ADJUSTMENT" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// Append-only record of one applied stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockHistory {
    /// Entry identifier.
    pub id: StockHistoryId,
    /// Affected item.
    pub item_id: ItemId,
    /// Movement kind.
    pub movement: StockMovement,
    /// Signed change applied.
    pub quantity: Quantity,
    /// Level before the change.
    pub previous_quantity: Quantity,
    /// Level after the change.
    pub new_quantity: Quantity,
    /// Id of the stock-in, adjustment, or stock-out that caused it.
    pub reference_id: Uuid,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Who approved the movement.
    pub created_by: UserId,
    /// When it was applied.
    pub created_at: DateTime<Utc>,
}

/// One line that cannot be supplied from current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    /// Short item.
    pub item_id: ItemId,
    /// Item name for messages.
    pub item_name: String,
    /// Quantity asked for.
    pub requested: Quantity,
    /// Quantity on hand.
    pub available: Quantity,
}

impl fmt::Display for StockShortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (requested {}, available {})",
            self.item_name, self.requested, self.available
        )
    }
}
