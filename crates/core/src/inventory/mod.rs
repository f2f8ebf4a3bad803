//! Stock ledger.
//!
//! Items carry their stock level. Receipts, adjustments, and stock-outs are
//! requests that change it only when approved; a stock-out is the sole
//! authority for deducting stock sold.

pub mod hook;
pub mod naming;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use hook::StockOutHook;
pub use service::{
    InventoryService, NewAdjustment, NewItem, NewStockIn, NewStockOut, StockOutLineInput,
};
pub use types::{
    AdjustmentType, ApprovalStatus, Item, ItemCategory, Review, StockAdjustment, StockHistory,
    StockIn, StockInSource, StockMovement, StockOut, StockOutLine, StockOutPurpose, StockShortage,
    StockStatus,
};
