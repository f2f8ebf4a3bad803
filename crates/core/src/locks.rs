//! Per-sale application locks.
//!
//! Every operation that can change a sale's status or its stock-out link
//! holds the sale's lock for the whole unit of work. The lock is always
//! taken before the unit of work begins.

use std::sync::Arc;

use dashmap::DashMap;
use simba_shared::types::SaleId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutexes, one per sale.
///
/// An entry lives only while some guard holds it or some caller waits on
/// it; the last guard to drop removes it.
#[derive(Debug, Default)]
pub struct SaleLocks {
    locks: DashMap<SaleId, Arc<Mutex<()>>>,
}

/// Held for as long as the sale must stay serialized.
#[derive(Debug)]
pub struct SaleGuard<'a> {
    sale_id: SaleId,
    locks: &'a SaleLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SaleGuard<'_> {
    /// The locked sale.
    #[must_use]
    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }
}

impl Drop for SaleGuard<'_> {
    fn drop(&mut self) {
        // Release first so our own reference no longer counts.
        drop(self.guard.take());
        self.locks
            .locks
            .remove_if(&self.sale_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SaleLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock of `sale`.
    pub async fn acquire(&self, sale: SaleId) -> SaleGuard<'_> {
        // Clone the mutex out so the map shard is not held across the await.
        let lock = Arc::clone(self.locks.entry(sale).or_default().value());
        SaleGuard {
            sale_id: sale,
            locks: self,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of sales currently locked or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no sale is locked or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
