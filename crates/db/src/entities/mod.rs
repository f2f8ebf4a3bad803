//! `SeaORM` entities, one module per table.

pub mod prelude;

pub mod accounts;
pub mod audit_logs;
pub mod customers;
pub mod incomes;
pub mod items;
pub mod payments;
pub mod sale_items;
pub mod sales;
pub mod stock_adjustments;
pub mod stock_history;
pub mod stock_ins;
pub mod stock_out_lines;
pub mod stock_outs;
pub mod transactions;
