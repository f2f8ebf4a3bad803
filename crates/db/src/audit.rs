//! Audit sink that writes events to the `audit_logs` table.

use sea_orm::{DatabaseConnection, EntityTrait};
use simba_core::audit::{AuditEvent, AuditSink};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::convert::audit_to_active;
use crate::entities::audit_logs;

/// Persists audit events on a background task.
///
/// Events are handed over after the business transaction commits, so a
/// failed insert is logged and never reaches the caller.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    db: DatabaseConnection,
}

impl PgAuditSink {
    /// Creates a sink writing through `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl AuditSink for PgAuditSink {
    fn record_event(&self, event: AuditEvent) {
        let Ok(handle) = Handle::try_current() else {
            warn!(
                event_id = %event.id,
                object_type = %event.object_type,
                "No async runtime, audit event dropped"
            );
            return;
        };

        let db = self.db.clone();
        let event_id = event.id;
        let model = audit_to_active(event);
        handle.spawn(async move {
            match audit_logs::Entity::insert(model).exec_without_returning(&db).await {
                Ok(_) => debug!(%event_id, "Audit event stored"),
                Err(e) => warn!(%event_id, error = %e, "Failed to store audit event"),
            }
        });
    }
}
