// Database models (internal, may differ from public DTOs)

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use callboard_core::{AreaRef, Event, NotificationPayload};

// ============================================
// Venue models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct VenueRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct VenueAreaRow {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CreateVenue {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateVenueArea {
    pub venue_id: Uuid,
    pub name: String,
    pub capacity: Option<i32>,
}

// ============================================
// Event models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub venue_id: Uuid,
    pub venue_name: String,
    pub venue_space: Option<String>,
    pub reviewer_id: Option<Uuid>,
    pub reviewer_name: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRow {
    /// Map to the domain entity, attaching the event's reserved areas
    pub fn into_event(self, areas: Vec<AreaRef>) -> anyhow::Result<Event> {
        Ok(Event {
            id: self.id,
            title: self.title,
            status: self
                .status
                .parse()
                .with_context(|| format!("event {} has bad status", self.id))?,
            description: self.description,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            venue_id: self.venue_id,
            venue_name: self.venue_name,
            venue_space: self.venue_space,
            areas,
            reviewer_id: self.reviewer_id,
            reviewer_name: self.reviewer_name,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateEventRow {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub venue_id: Uuid,
    pub venue_space: Option<String>,
    pub created_by: Uuid,
}

// ============================================
// Event version models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventVersionRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub version: i32,
    pub payload: sqlx::types::JsonValue,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEventVersion {
    pub event_id: Uuid,
    pub version: i32,
    pub payload: serde_json::Value,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<Uuid>,
}

// ============================================
// Notification models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub kind: String,
    pub target_user: Uuid,
    pub status: String,
    pub payload: sqlx::types::JsonValue,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationRow {
    /// Decode the persisted payload contract
    pub fn parsed_payload(&self) -> anyhow::Result<NotificationPayload> {
        serde_json::from_value(self.payload.clone())
            .with_context(|| format!("notification {} has bad payload", self.id))
    }
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub kind: String,
    pub target_user: Uuid,
    pub payload: serde_json::Value,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNotification {
    pub status: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub due_at: Option<DateTime<Utc>>,
}

// ============================================
// Audit log models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_kind: String,
    pub entity_id: Uuid,
    pub details: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

/// (event, area) pairing used to assemble domain events in bulk
#[derive(Debug, Clone, FromRow)]
pub struct EventAreaRefRow {
    pub event_id: Uuid,
    pub area_id: Uuid,
    pub area_name: String,
}
