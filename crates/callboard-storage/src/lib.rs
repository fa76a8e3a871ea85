// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - DbAuditObserver: implements AuditObserver against the audit_log table

pub mod audit;
pub mod models;
pub mod repositories;

pub use audit::{create_db_audit_observer, DbAuditObserver};
pub use models::*;
pub use repositories::*;
