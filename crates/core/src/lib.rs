//! Core business logic for the Simba back office.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence goes through the traits in [`store`], implemented by the db crate
//! and by the in-memory store used in tests.
//!
//! # Modules
//!
//! - `ledger` - Accounts, balanced transactions, incomes
//! - `inventory` - Items and approval-gated stock movements
//! - `sales` - The sale aggregate and its status machine
//! - `reconciliation` - Completing sales when their stock-out is approved
//! - `access` - Actors and module capabilities
//! - `audit` - Post-commit audit trail

pub mod access;
pub mod audit;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod locks;
pub mod reconciliation;
pub mod sales;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use access::{Actor, Module};
pub use error::CoreError;
pub use services::Services;
