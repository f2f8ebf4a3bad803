//! One-way audit trail.
//!
//! Services collect events in an [`AuditBatch`] while a unit of work is
//! open and hand them to the [`AuditSink`] only after it commits. A sink
//! never fails the caller.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use simba_shared::types::{AuditEventId, UserId};

use crate::access::{Actor, Module};

/// Audited action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Record created.
    Create,
    /// Record changed.
    Update,
    /// Record removed or voided.
    Delete,
    /// Request approved.
    Approve,
    /// Request rejected.
    Reject,
    /// Record cancelled.
    Cancel,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::Cancel => "CANCEL",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CREATE" => Some(Self::Create),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "APPROVE" => Some(Self::Approve),
            "REJECT" => Some(Self::Reject),
            "CANCEL" => Some(Self::Cancel),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub id: AuditEventId,
    /// Who performed the action.
    pub actor_id: UserId,
    /// Actor display name at the time of the action.
    pub actor_name: String,
    /// What was done.
    pub action: AuditAction,
    /// Which module the object belongs to.
    pub module: Module,
    /// Object kind, e.g. `"sale"` or `"stock_out"`.
    pub object_type: String,
    /// Object identifier.
    pub object_id: String,
    /// Human readable summary.
    pub description: String,
    /// State before the change.
    pub before: Option<Value>,
    /// State after the change.
    pub after: Option<Value>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event without before/after snapshots.
    pub fn new(
        actor: &Actor,
        action: AuditAction,
        module: Module,
        object_type: &str,
        object_id: impl ToString,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            action,
            module,
            object_type: object_type.to_string(),
            object_id: object_id.to_string(),
            description: description.into(),
            before: None,
            after: None,
            occurred_at: Utc::now(),
        }
    }

    /// Attaches a snapshot of the state before the change.
    #[must_use]
    pub fn with_before<T: Serialize>(mut self, before: &T) -> Self {
        self.before = serde_json::to_value(before).ok();
        self
    }

    /// Attaches a snapshot of the state after the change.
    #[must_use]
    pub fn with_after<T: Serialize>(mut self, after: &T) -> Self {
        self.after = serde_json::to_value(after).ok();
        self
    }
}

/// Fire-and-forget audit writer.
pub trait AuditSink: Send + Sync {
    /// Records an event. Implementations swallow and log their own failures.
    fn record_event(&self, event: AuditEvent);
}

/// Writes audit events as structured `tracing` events on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record_event(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            event_id = %event.id,
            actor_id = %event.actor_id,
            actor = %event.actor_name,
            action = %event.action,
            module = %event.module,
            object_type = %event.object_type,
            object_id = %event.object_id,
            "{}",
            event.description
        );
    }
}

/// Keeps events in memory; used by tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events recorded for one object.
    pub fn events_for(&self, object_type: &str, object_id: impl ToString) -> Vec<AuditEvent> {
        let object_id = object_id.to_string();
        self.events()
            .into_iter()
            .filter(|e| e.object_type == object_type && e.object_id == object_id)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record_event(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Events gathered inside a unit of work, flushed once it commits.
#[derive(Debug, Default)]
pub struct AuditBatch {
    events: Vec<AuditEvent>,
}

impl AuditBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event.
    pub fn push(&mut self, event: AuditEvent) {
        self.events.push(event);
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hands every queued event to `sink`, in order.
    pub fn flush(self, sink: &dyn AuditSink) {
        for event in self.events {
            sink.record_event(event);
        }
    }
}
