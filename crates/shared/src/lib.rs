//! Shared types, errors, and configuration for the Simba back office.
//!
//! This crate provides common types used across all other crates:
//! - Money and Quantity with fixed-point decimal rounding
//! - Typed IDs for type-safe entity references
//! - Pagination types for list projections
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AccountRef, AppConfig, InventoryConfig, LedgerConfig};
pub use error::{AppError, AppResult};
