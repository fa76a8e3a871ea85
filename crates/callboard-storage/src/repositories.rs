// Repository layer for database operations

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use callboard_core::{AreaRef, Event};

use crate::models::*;

/// Attempts to claim a version number before giving up on a racing writer
const VERSION_INSERT_ATTEMPTS: u32 = 3;

const EVENT_COLUMNS: &str = r#"
    e.id, e.title, e.description, e.status, e.starts_at, e.ends_at,
    e.venue_id, v.name AS venue_name, e.venue_space,
    e.reviewer_id, e.reviewer_name, e.created_by, e.created_at, e.updated_at
"#;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Venues
    // ============================================

    pub async fn create_venue(&self, input: CreateVenue) -> Result<VenueRow> {
        let row = sqlx::query_as::<_, VenueRow>(
            r#"
            INSERT INTO venues (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_venue(&self, id: Uuid) -> Result<Option<VenueRow>> {
        let row = sqlx::query_as::<_, VenueRow>(
            r#"
            SELECT id, name, created_at
            FROM venues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn create_venue_area(&self, input: CreateVenueArea) -> Result<VenueAreaRow> {
        let row = sqlx::query_as::<_, VenueAreaRow>(
            r#"
            INSERT INTO venue_areas (id, venue_id, name, capacity)
            VALUES ($1, $2, $3, $4)
            RETURNING id, venue_id, name, capacity
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.venue_id)
        .bind(&input.name)
        .bind(input.capacity)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_venue_areas(&self, venue_id: Uuid) -> Result<Vec<VenueAreaRow>> {
        let rows = sqlx::query_as::<_, VenueAreaRow>(
            r#"
            SELECT id, venue_id, name, capacity
            FROM venue_areas
            WHERE venue_id = $1
            ORDER BY name
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO events (id, title, description, status, starts_at, ends_at,
                                venue_id, venue_space, created_by)
            VALUES ($1, $2, $3, 'draft', $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.venue_id)
        .bind(&input.venue_space)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await?;

        match self.get_event(id).await? {
            Some(row) => Ok(row),
            None => bail!("event {id} vanished after insert"),
        }
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events e
            JOIN venues v ON v.id = e.venue_id
            WHERE e.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events e
            JOIN venues v ON v.id = e.venue_id
            ORDER BY e.created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_event_status(&self, id: Uuid, status: &str) -> Result<Option<EventRow>> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_event(id).await
    }

    pub async fn set_event_reviewer(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        reviewer_name: &str,
    ) -> Result<Option<EventRow>> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET reviewer_id = $2, reviewer_name = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reviewer_id)
        .bind(reviewer_name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_event(id).await
    }

    /// Hard delete. Used only to compensate a creation whose version snapshot
    /// failed to write.
    pub async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_event_areas(&self, event_id: Uuid, area_ids: &[Uuid]) -> Result<()> {
        sqlx::query("DELETE FROM event_areas WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        for area_id in area_ids {
            sqlx::query(
                r#"
                INSERT INTO event_areas (event_id, area_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(event_id)
            .bind(area_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn area_refs_for_event(&self, event_id: Uuid) -> Result<Vec<AreaRef>> {
        let rows = sqlx::query_as::<_, EventAreaRefRow>(
            r#"
            SELECT ea.event_id, a.id AS area_id, a.name AS area_name
            FROM event_areas ea
            JOIN venue_areas a ON a.id = ea.area_id
            WHERE ea.event_id = $1
            ORDER BY a.name
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AreaRef {
                id: r.area_id,
                name: r.area_name,
            })
            .collect())
    }

    /// Load every event with its reserved areas as domain entities.
    ///
    /// This is the snapshot the analytics aggregator and the batch jobs work
    /// from; the working set is small (tens of rows).
    pub async fn load_events_with_areas(&self) -> Result<Vec<Event>> {
        let rows = self.list_events().await?;

        let refs = sqlx::query_as::<_, EventAreaRefRow>(
            r#"
            SELECT ea.event_id, a.id AS area_id, a.name AS area_name
            FROM event_areas ea
            JOIN venue_areas a ON a.id = ea.area_id
            ORDER BY a.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<Uuid, Vec<AreaRef>> = HashMap::new();
        for r in refs {
            by_event.entry(r.event_id).or_default().push(AreaRef {
                id: r.area_id,
                name: r.area_name,
            });
        }

        rows.into_iter()
            .map(|row| {
                let areas = by_event.remove(&row.id).unwrap_or_default();
                row.into_event(areas)
            })
            .collect()
    }

    // ============================================
    // Event versions (append-only)
    // ============================================

    pub async fn next_version_number(&self, event_id: Uuid) -> Result<i32> {
        let next: i32 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(version), 0) + 1
            FROM event_versions
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(next)
    }

    /// Insert a version row; `Ok(None)` means a concurrent writer claimed the
    /// number first (unique violation) and the caller should recompute.
    pub async fn insert_event_version(
        &self,
        input: CreateEventVersion,
    ) -> Result<Option<EventVersionRow>> {
        let result = sqlx::query_as::<_, EventVersionRow>(
            r#"
            INSERT INTO event_versions (id, event_id, version, payload, submitted_at, submitted_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, event_id, version, payload, submitted_at, submitted_by, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.event_id)
        .bind(input.version)
        .bind(&input.payload)
        .bind(input.submitted_at)
        .bind(input.submitted_by)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(Some(row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Append the next version, recomputing max+1 when a racing writer wins.
    pub async fn append_next_version(
        &self,
        event_id: Uuid,
        payload: serde_json::Value,
        submitted_at: Option<DateTime<Utc>>,
        submitted_by: Option<Uuid>,
    ) -> Result<EventVersionRow> {
        for _ in 0..VERSION_INSERT_ATTEMPTS {
            let version = self.next_version_number(event_id).await?;
            let inserted = self
                .insert_event_version(CreateEventVersion {
                    event_id,
                    version,
                    payload: payload.clone(),
                    submitted_at,
                    submitted_by,
                })
                .await?;
            match inserted {
                Some(row) => return Ok(row),
                None => {
                    tracing::warn!(
                        event_id = %event_id,
                        version,
                        "version number raced, recomputing"
                    );
                }
            }
        }
        bail!("could not claim a version number for event {event_id} after {VERSION_INSERT_ATTEMPTS} attempts")
    }

    pub async fn list_event_versions(&self, event_id: Uuid) -> Result<Vec<EventVersionRow>> {
        let rows = sqlx::query_as::<_, EventVersionRow>(
            r#"
            SELECT id, event_id, version, payload, submitted_at, submitted_by, created_at
            FROM event_versions
            WHERE event_id = $1
            ORDER BY version
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn latest_event_version(&self, event_id: Uuid) -> Result<Option<EventVersionRow>> {
        let row = sqlx::query_as::<_, EventVersionRow>(
            r#"
            SELECT id, event_id, version, payload, submitted_at, submitted_by, created_at
            FROM event_versions
            WHERE event_id = $1
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Notifications
    // ============================================

    pub async fn insert_notification(&self, input: CreateNotification) -> Result<NotificationRow> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (id, kind, target_user, status, payload, due_at)
            VALUES ($1, $2, $3, 'queued', $4, $5)
            RETURNING id, kind, target_user, status, payload, due_at, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.kind)
        .bind(input.target_user)
        .bind(&input.payload)
        .bind(input.due_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_notification(
        &self,
        id: Uuid,
        input: UpdateNotification,
    ) -> Result<Option<NotificationRow>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications
            SET
                status = COALESCE($2, status),
                payload = COALESCE($3, payload),
                due_at = COALESCE($4, due_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, kind, target_user, status, payload, due_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.status)
        .bind(&input.payload)
        .bind(input.due_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Notifications of a kind ready for a delivery attempt
    pub async fn list_due_notifications(
        &self,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<NotificationRow>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, kind, target_user, status, payload, due_at, created_at, updated_at
            FROM notifications
            WHERE kind = $1 AND status IN ('queued', 'failed') AND due_at <= $2
            ORDER BY due_at
            "#,
        )
        .bind(kind)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent notification for (kind, target, event) since the given
    /// instant: the dedup-window query
    pub async fn find_recent_notification(
        &self,
        kind: &str,
        target_user: Uuid,
        event_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<NotificationRow>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, kind, target_user, status, payload, due_at, created_at, updated_at
            FROM notifications
            WHERE kind = $1
              AND target_user = $2
              AND payload->>'event_id' = $3
              AND created_at >= $4
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(kind)
        .bind(target_user)
        .bind(event_id.to_string())
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Audit log (append-only)
    // ============================================

    pub async fn append_audit_entry(
        &self,
        actor_id: Uuid,
        action: &str,
        entity_kind: &str,
        entity_id: Uuid,
        details: &serde_json::Value,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, actor_id, action, entity_kind, entity_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(actor_id)
        .bind(action)
        .bind(entity_kind)
        .bind(entity_id)
        .bind(details)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
