// Shared per-item delivery bookkeeping
//
// Every attempt, success or failure, is persisted onto the notification row
// before the loop moves to the next item.

use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use callboard_core::{ExistingNotification, NotificationPayload, SendMeta};
use callboard_storage::{Database, NotificationRow, UpdateNotification};

/// What happened to one item of a job run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Dispatched,
    Queued,
    Skipped,
    Failed,
}

/// Project a stored row into the dedup policy's view of it
pub(crate) fn existing_from_row(row: &NotificationRow) -> Result<ExistingNotification> {
    Ok(ExistingNotification {
        id: row.id,
        status: row.status.parse()?,
        attempted_at: row
            .parsed_payload()
            .ok()
            .and_then(|p| p.send_meta.attempted_at),
    })
}

pub(crate) async fn mark_sent(
    db: &Database,
    id: Uuid,
    event_id: Uuid,
    prior: &SendMeta,
    now: DateTime<Utc>,
) -> Result<()> {
    let payload = NotificationPayload {
        event_id,
        send_meta: prior.sent(now),
    };
    db.update_notification(
        id,
        UpdateNotification {
            status: Some("sent".to_string()),
            payload: Some(serde_json::to_value(&payload)?),
            due_at: None,
        },
    )
    .await?;
    Ok(())
}

pub(crate) async fn mark_failed(
    db: &Database,
    id: Uuid,
    event_id: Uuid,
    prior: &SendMeta,
    now: DateTime<Utc>,
    error: &str,
    retry_after: Option<DateTime<Utc>>,
) -> Result<()> {
    let mut send_meta = prior.failed_attempt(now, error);
    send_meta.retry_after = retry_after;
    let payload = NotificationPayload { event_id, send_meta };
    db.update_notification(
        id,
        UpdateNotification {
            status: Some("failed".to_string()),
            payload: Some(serde_json::to_value(&payload)?),
            due_at: retry_after,
        },
    )
    .await?;
    Ok(())
}

pub(crate) async fn mark_cancelled(
    db: &Database,
    id: Uuid,
    event_id: Uuid,
    prior: &SendMeta,
    now: DateTime<Utc>,
    error: &str,
) -> Result<()> {
    let payload = NotificationPayload {
        event_id,
        send_meta: prior.failed_attempt(now, error),
    };
    db.update_notification(
        id,
        UpdateNotification {
            status: Some("cancelled".to_string()),
            payload: Some(serde_json::to_value(&payload)?),
            due_at: None,
        },
    )
    .await?;
    Ok(())
}
