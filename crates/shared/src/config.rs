//! Application configuration management.
//!
//! Configuration is an explicit value handed to the services that need it;
//! nothing reads process-wide defaults at call time.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{Currency, Quantity};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger and chart-of-accounts configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Inventory defaults.
    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// A well-known chart-of-accounts entry resolved by code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountRef {
    /// Unique account code.
    pub code: String,
    /// Display name used when the account is provisioned.
    pub name: String,
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Currency of sales, incomes, and the bootstrap accounts.
    #[serde(default)]
    pub currency: Currency,
    /// Cash/Bank asset account debited when sale income is recognized.
    #[serde(default = "default_cash_account")]
    pub cash_account: AccountRef,
    /// Revenue account credited when sale income is recognized.
    #[serde(default = "default_sales_revenue_account")]
    pub sales_revenue_account: AccountRef,
}

fn default_cash_account() -> AccountRef {
    AccountRef {
        code: "1000".to_string(),
        name: "Cash".to_string(),
    }
}

fn default_sales_revenue_account() -> AccountRef {
    AccountRef {
        code: "4000".to_string(),
        name: "Sales Revenue".to_string(),
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            cash_account: default_cash_account(),
            sales_revenue_account: default_sales_revenue_account(),
        }
    }
}

/// Inventory defaults applied when an item is created without explicit levels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryConfig {
    /// Stock level at or below which an item is "low".
    #[serde(default = "default_reorder_level")]
    pub default_reorder_level: Quantity,
    /// Stock level at or below which an item is "critical".
    #[serde(default = "default_minimum_stock")]
    pub default_minimum_stock: Quantity,
    /// Unit of measure for new items.
    #[serde(default = "default_unit_of_measure")]
    pub default_unit_of_measure: String,
}

fn default_reorder_level() -> Quantity {
    Quantity::new(Decimal::TEN)
}

fn default_minimum_stock() -> Quantity {
    Quantity::new(Decimal::from(5))
}

fn default_unit_of_measure() -> String {
    "kg".to_string()
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_reorder_level: default_reorder_level(),
            default_minimum_stock: default_minimum_stock(),
            default_unit_of_measure: default_unit_of_measure(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `SIMBA__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SIMBA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
