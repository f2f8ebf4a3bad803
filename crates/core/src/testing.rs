//! Shared fixtures for service tests.

use std::sync::Arc;

use rust_decimal::Decimal;
use simba_shared::types::{Currency, ItemId, Money, Quantity, UserId};
use simba_shared::{InventoryConfig, LedgerConfig};

use crate::access::{Actor, Module};
use crate::audit::{AuditSink, MemoryAuditSink};
use crate::inventory::{Item, NewItem, NewStockIn, StockInSource};
use crate::sales::{Customer, NewCustomer, NewSale, NewSaleItem, Sale};
use crate::services::Services;
use crate::store::memory::MemoryStore;

pub(crate) fn tsh(amount: Decimal) -> Money {
    Money::new(amount, Currency::Tzs)
}

pub(crate) fn units(value: i64) -> Quantity {
    Quantity::units(value)
}

/// An actor holding only `modules`.
pub(crate) fn clerk(modules: &[Module]) -> Actor {
    Actor::new(UserId::new(), "clerk", modules.iter().copied())
}

/// One priced line for [`Fixture::approved_sale`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line {
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
}

pub(crate) struct Fixture {
    pub services: Services<MemoryStore>,
    pub store: MemoryStore,
    pub audit: Arc<MemoryAuditSink>,
    pub admin: Actor,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let store = MemoryStore::new();
        let audit = Arc::new(MemoryAuditSink::new());
        let services = Services::new(
            store.clone(),
            LedgerConfig::default(),
            InventoryConfig::default(),
            Arc::clone(&audit) as Arc<dyn AuditSink>,
        );
        Self {
            services,
            store,
            audit,
            admin: Actor::system("admin"),
        }
    }

    /// Creates an item and receives `stock` units through an auto-approved stock-in.
    pub(crate) async fn item(&self, name: &str, stock: i64, price: Decimal) -> Item {
        let item = self
            .services
            .inventory
            .create_item(
                NewItem {
                    name: name.to_string(),
                    selling_price: Some(tsh(price)),
                    ..NewItem::default()
                },
                &self.admin,
            )
            .await
            .unwrap();
        if stock > 0 {
            self.services
                .inventory
                .record_stock_in(
                    NewStockIn {
                        item_id: item.id,
                        quantity: units(stock),
                        source: StockInSource::Purchase,
                        supplier: None,
                        reference: None,
                        notes: None,
                        auto_approve: true,
                    },
                    &self.admin,
                )
                .await
                .unwrap();
        }
        self.services.inventory.get_item(item.id).await.unwrap()
    }

    pub(crate) async fn customer(&self, name: &str) -> Customer {
        self.services
            .sales
            .create_customer(
                NewCustomer {
                    name: name.to_string(),
                    ..NewCustomer::default()
                },
                &self.admin,
            )
            .await
            .unwrap()
    }

    /// A draft sale for a fresh customer.
    pub(crate) async fn draft_sale(&self, lines: &[Line]) -> Sale {
        let customer = self.customer(&format!("Customer {}", UserId::new())).await;
        let mut sale = self
            .services
            .sales
            .create_sale(
                NewSale {
                    customer_id: customer.id,
                    sale_type: Default::default(),
                    notes: None,
                },
                &self.admin,
            )
            .await
            .unwrap();
        for line in lines {
            sale = self
                .services
                .sales
                .add_item(
                    sale.id,
                    NewSaleItem {
                        item_id: line.item_id,
                        quantity: units(line.quantity),
                        unit_price: Some(tsh(line.unit_price)),
                        tax_rate: line.tax_rate,
                    },
                    &self.admin,
                )
                .await
                .unwrap();
        }
        sale
    }

    /// A submitted and approved sale.
    pub(crate) async fn approved_sale(&self, lines: &[Line]) -> Sale {
        let sale = self.draft_sale(lines).await;
        self.services.sales.submit(sale.id, &self.admin).await.unwrap();
        self.services.sales.approve(sale.id, &self.admin).await.unwrap()
    }
}
