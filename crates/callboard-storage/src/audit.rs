//! Database-backed AuditObserver implementation
//!
//! Appends to the audit_log table. Write failures are logged and swallowed;
//! the audit trail is a best-effort side channel and must never fail the
//! action that produced the entry.

use async_trait::async_trait;

use callboard_core::{AuditEntry, AuditObserver};

use crate::repositories::Database;

/// Audit observer that appends entries to the audit_log table
#[derive(Clone)]
pub struct DbAuditObserver {
    db: Database,
}

impl DbAuditObserver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditObserver for DbAuditObserver {
    async fn record(&self, entry: AuditEntry) {
        let result = self
            .db
            .append_audit_entry(
                entry.actor_id,
                &entry.action,
                &entry.entity_kind,
                entry.entity_id,
                &entry.details,
                entry.at,
            )
            .await;

        if let Err(e) = result {
            tracing::warn!(
                action = %entry.action,
                entity_id = %entry.entity_id,
                error = %e,
                "audit write failed; continuing"
            );
        }
    }
}

/// Create a database-backed audit observer
pub fn create_db_audit_observer(db: Database) -> DbAuditObserver {
    DbAuditObserver::new(db)
}
