//! Wiring of the services around one store and one lock registry.

use std::sync::Arc;

use simba_shared::{AppConfig, InventoryConfig, LedgerConfig};

use crate::audit::AuditSink;
use crate::inventory::InventoryService;
use crate::ledger::LedgerService;
use crate::locks::SaleLocks;
use crate::reconciliation::Reconciler;
use crate::sales::SalesService;
use crate::store::Store;

/// Every service, sharing the store, the audit sink, and the sale locks.
pub struct Services<S: Store + Clone> {
    /// Chart of accounts, postings, incomes.
    pub ledger: LedgerService<S>,
    /// Items and stock movements; reconciles sales on stock-out decisions.
    pub inventory: InventoryService<S, Reconciler<S>>,
    /// Customers and sales.
    pub sales: SalesService<S>,
    /// Manual reconciliation entry point.
    pub reconciler: Reconciler<S>,
    /// The shared per-sale locks.
    pub locks: Arc<SaleLocks>,
}

impl<S: Store + Clone> Services<S> {
    /// Wires the services.
    pub fn new(
        store: S,
        ledger: LedgerConfig,
        inventory: InventoryConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let locks = Arc::new(SaleLocks::new());
        let reconciler = Reconciler::new(
            store.clone(),
            Arc::clone(&locks),
            ledger.clone(),
            Arc::clone(&audit),
        );
        Self {
            ledger: LedgerService::new(store.clone(), ledger.clone(), Arc::clone(&audit)),
            inventory: InventoryService::new(
                store.clone(),
                reconciler.clone(),
                Arc::clone(&locks),
                inventory,
                Arc::clone(&audit),
            ),
            sales: SalesService::new(store, Arc::clone(&locks), ledger, audit),
            reconciler,
            locks,
        }
    }

    /// Wires the services from the application configuration.
    pub fn from_config(store: S, config: &AppConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self::new(store, config.ledger.clone(), config.inventory.clone(), audit)
    }
}
