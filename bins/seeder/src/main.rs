//! Database seeder for Simba development and testing.
//!
//! Seeds the bootstrap chart of accounts, a walk-in customer, and a few
//! stocked items. Running it again skips whatever already exists.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use simba_core::inventory::{ItemCategory, NewItem, NewStockIn, StockInSource};
use simba_core::sales::{CustomerType, NewCustomer};
use simba_core::{Actor, CoreError, Services};
use simba_db::{PgAuditSink, PgStore};
use simba_shared::{AppConfig, AppError, AppResult};
use simba_shared::types::{Money, Quantity};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Seed items: name, SKU, category, selling price, opening stock.
const ITEMS: &[(&str, &str, ItemCategory, i64, i64)] = &[
    ("Coarse Salt", "SALT-CRS-50", ItemCategory::FinishedGoods, 45_000, 120),
    ("Fine Table Salt", "SALT-FIN-25", ItemCategory::FinishedGoods, 28_000, 200),
    ("Rock Salt", "SALT-RCK-01", ItemCategory::RawMaterials, 900, 1_500),
    ("Potassium Iodate", "CHEM-KIO3", ItemCategory::Chemicals, 65_000, 40),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simba=info,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    info!("Connecting to database...");
    let db = simba_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    let store = PgStore::new(db.clone());
    let services = Services::from_config(store, &config, Arc::new(PgAuditSink::new(db)));
    let admin = Actor::system("seeder");

    if let Err(err) = seed(&services, &config, &admin).await {
        error!(code = err.error_code(), "Seeding failed: {err}");
        return Err(err.into());
    }

    info!("Seeding complete!");
    Ok(())
}

/// Seeds everything, converting domain failures into [`AppError`].
async fn seed(services: &Services<PgStore>, config: &AppConfig, admin: &Actor) -> AppResult<()> {
    info!("Seeding chart of accounts...");
    let (cash, revenue) = services.ledger.bootstrap_chart(admin).await?;
    info!(cash = %cash.code, revenue = %revenue.code, "Chart of accounts ready");

    info!("Seeding customers...");
    let customer = services
        .sales
        .create_customer(
            NewCustomer {
                name: "Walk-in Customer".to_string(),
                customer_type: CustomerType::Individual,
                ..NewCustomer::default()
            },
            admin,
        )
        .await;
    match customer {
        Ok(customer) => info!(customer_id = %customer.id, "Created walk-in customer"),
        Err(CoreError::Duplicate { .. }) => info!("  Walk-in customer already exists, skipping..."),
        Err(e) => return Err(AppError::from(e)),
    }

    info!("Seeding items...");
    let currency = config.ledger.currency;
    for (name, sku, category, price, stock) in ITEMS {
        let created = services
            .inventory
            .create_item(
                NewItem {
                    name: (*name).to_string(),
                    sku: Some((*sku).to_string()),
                    category: Some(*category),
                    selling_price: Some(Money::new(Decimal::from(*price), currency)),
                    ..NewItem::default()
                },
                admin,
            )
            .await;
        let item = match created {
            Ok(item) => item,
            Err(CoreError::Duplicate { .. }) => {
                info!("  {name} already exists, skipping...");
                continue;
            }
            Err(e) => return Err(AppError::from(e)),
        };

        services
            .inventory
            .record_stock_in(
                NewStockIn {
                    item_id: item.id,
                    quantity: Quantity::units(*stock),
                    source: StockInSource::Purchase,
                    supplier: Some("Opening balance".to_string()),
                    reference: None,
                    notes: Some("Seeded opening stock".to_string()),
                    auto_approve: true,
                },
                admin,
            )
            .await?;
        info!(item = %item.name, stock = *stock, "Seeded item");
    }
    Ok(())
}
