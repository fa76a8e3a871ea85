// Notification domain types
//
// The payload shape is the persisted contract other jobs read to decide
// dedup and backoff: { event_id, send_meta: { attempted_at, retry_count,
// error, retry_after } }. Unknown fields are tolerated on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::LifecycleError;

/// Notification kind, one per reminder job family
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DraftReminder,
    SlaWarning,
    WeeklyDigest,
    AiPublish,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::DraftReminder => "draft_reminder",
            NotificationKind::SlaWarning => "sla_warning",
            NotificationKind::WeeklyDigest => "weekly_digest",
            NotificationKind::AiPublish => "ai_publish",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft_reminder" => Ok(NotificationKind::DraftReminder),
            "sla_warning" => Ok(NotificationKind::SlaWarning),
            "weekly_digest" => Ok(NotificationKind::WeeklyDigest),
            "ai_publish" => Ok(NotificationKind::AiPublish),
            other => Err(LifecycleError::UnknownStatus(other.to_string())),
        }
    }
}

/// Notification lifecycle status
///
/// `sent` and `cancelled` are terminal; `failed` is retryable by a later run
/// unless the backoff policy suppresses it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Queued,
    Sent,
    Failed,
    Cancelled,
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationStatus::Queued => "queued",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
            NotificationStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for NotificationStatus {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(NotificationStatus::Queued),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            "cancelled" => Ok(NotificationStatus::Cancelled),
            other => Err(LifecycleError::UnknownStatus(other.to_string())),
        }
    }
}

impl NotificationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Cancelled)
    }
}

/// Delivery bookkeeping, mutated in place on each attempt
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SendMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<DateTime<Utc>>,
}

impl SendMeta {
    /// Bookkeeping for a failed attempt
    pub fn failed_attempt(&self, now: DateTime<Utc>, error: impl Into<String>) -> SendMeta {
        SendMeta {
            attempted_at: Some(now),
            retry_count: self.retry_count + 1,
            error: Some(error.into()),
            retry_after: self.retry_after,
        }
    }

    /// Bookkeeping for a successful attempt
    pub fn sent(&self, now: DateTime<Utc>) -> SendMeta {
        SendMeta {
            attempted_at: Some(now),
            retry_count: self.retry_count,
            error: None,
            retry_after: None,
        }
    }
}

/// Persisted notification payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NotificationPayload {
    pub event_id: Uuid,
    #[serde(default)]
    pub send_meta: SendMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_and_tolerates_missing_meta() {
        let raw = serde_json::json!({
            "event_id": Uuid::now_v7(),
        });
        let payload: NotificationPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.send_meta, SendMeta::default());

        let raw = serde_json::json!({
            "event_id": Uuid::now_v7(),
            "send_meta": { "retry_count": 2, "error": "timeout", "unknown_field": true },
        });
        let payload: NotificationPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.send_meta.retry_count, 2);
        assert_eq!(payload.send_meta.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn failed_attempt_increments_retry_count() {
        let now = "2025-05-01T00:00:00Z".parse().unwrap();
        let meta = SendMeta::default().failed_attempt(now, "smtp 451");
        assert_eq!(meta.retry_count, 1);
        let meta = meta.failed_attempt(now, "smtp 451");
        assert_eq!(meta.retry_count, 2);
        let meta = meta.sent(now);
        assert_eq!(meta.retry_count, 2);
        assert!(meta.error.is_none());
    }
}
