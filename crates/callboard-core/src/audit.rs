// Audit trail observer
//
// Best-effort side channel: every state-changing action reports here after it
// succeeds, and implementations must swallow their own failures. An audit
// write failing never fails the action that triggered it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor_id: Uuid,
    /// Dotted action name, e.g. "event.submit"
    pub action: String,
    pub entity_kind: String,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn for_event(
        actor_id: Uuid,
        action: &str,
        event_id: Uuid,
        details: serde_json::Value,
        at: DateTime<Utc>,
    ) -> Self {
        AuditEntry {
            actor_id,
            action: action.to_string(),
            entity_kind: "event".to_string(),
            entity_id: event_id,
            details,
            at,
        }
    }
}

/// Non-blocking observer the core calls after each state transition
#[async_trait]
pub trait AuditObserver: Send + Sync {
    /// Record an entry. Implementations log and swallow failures.
    async fn record(&self, entry: AuditEntry);
}

/// Observer that drops everything; used in tests and tools
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditObserver;

#[async_trait]
impl AuditObserver for NullAuditObserver {
    async fn record(&self, _entry: AuditEntry) {}
}
