//! Database layer with `SeaORM` entities and the Postgres-backed store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - [`PgStore`], implementing the core store traits over Postgres
//! - [`PgAuditSink`], writing the audit trail to `audit_logs`
//! - Database migrations

pub mod audit;
mod convert;
pub mod entities;
pub mod migration;
pub mod store;

pub use audit::PgAuditSink;
pub use store::{PgStore, PgTx};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use simba_shared::config::DatabaseConfig;

/// Establishes a connection pool using the configured limits.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
