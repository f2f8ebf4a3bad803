//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::customers::Entity as Customers;
pub use super::incomes::Entity as Incomes;
pub use super::items::Entity as Items;
pub use super::payments::Entity as Payments;
pub use super::sale_items::Entity as SaleItems;
pub use super::sales::Entity as Sales;
pub use super::stock_adjustments::Entity as StockAdjustments;
pub use super::stock_history::Entity as StockHistory;
pub use super::stock_ins::Entity as StockIns;
pub use super::stock_out_lines::Entity as StockOutLines;
pub use super::stock_outs::Entity as StockOuts;
pub use super::transactions::Entity as Transactions;
