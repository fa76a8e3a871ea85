// Reminder dedup and retry policy
//
// This is the idempotency mechanism that makes frequent re-invocation of the
// reminder jobs safe: a repeat notification of the same kind for the same
// (target, event) within the dedup window is suppressed or merged onto the
// existing row, never inserted twice.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::event::{Event, EventStatus};
use crate::notification::NotificationStatus;

/// Window within which a repeat notification is suppressed or merged
pub const DEDUP_WINDOW_HOURS: i64 = 24;

/// Minimum spacing between delivery attempts for the same notification
pub const RETRY_BACKOFF_MINUTES: i64 = 60;

/// Drafts untouched for this long get a reminder
pub const DRAFT_REMINDER_AFTER_DAYS: i64 = 3;

/// Base delay for publish-dispatch retries; doubles per retry
pub const PUBLISH_RETRY_BASE_MINUTES: i64 = 5;

/// Publish dispatches past this many retries are cancelled
pub const MAX_PUBLISH_RETRIES: u32 = 5;

/// Prior notification of the same kind/target/event inside the dedup window
#[derive(Debug, Clone)]
pub struct ExistingNotification {
    pub id: Uuid,
    pub status: NotificationStatus,
    pub attempted_at: Option<DateTime<Utc>>,
}

/// Why an item was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A notification for this (target, event) was already delivered
    AlreadySent,
    /// Last attempt was too recent; a later run will retry
    Backoff,
}

/// What a reminder job should do for one (target, event)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// No prior row in the window: insert a fresh notification
    SendNew,
    /// Suppress this item
    Skip(SkipReason),
    /// Attempt delivery again, updating the existing row in place
    RetryExisting(Uuid),
}

/// Decide what to do given the most recent notification inside the dedup
/// window (callers query with the 24h window; `None` means no row matched).
pub fn evaluate_dedup(existing: Option<&ExistingNotification>, now: DateTime<Utc>) -> DedupDecision {
    let Some(prior) = existing else {
        return DedupDecision::SendNew;
    };
    if prior.status == NotificationStatus::Sent {
        return DedupDecision::Skip(SkipReason::AlreadySent);
    }
    if let Some(attempted_at) = prior.attempted_at {
        if now - attempted_at < Duration::minutes(RETRY_BACKOFF_MINUTES) {
            return DedupDecision::Skip(SkipReason::Backoff);
        }
    }
    DedupDecision::RetryExisting(prior.id)
}

/// Exponential retry delay for publish dispatches: 5 min * 2^retries
pub fn publish_retry_after(retry_count: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let factor = 2i64.saturating_pow(retry_count.min(16));
    now + Duration::minutes(PUBLISH_RETRY_BASE_MINUTES.saturating_mul(factor))
}

/// Draft-reminder due rule: still a draft, untouched for the reminder window,
/// and either unscheduled or starting in the future.
pub fn draft_reminder_due(event: &Event, now: DateTime<Utc>) -> bool {
    if event.status != EventStatus::Draft {
        return false;
    }
    if now - event.updated_at < Duration::days(DRAFT_REMINDER_AFTER_DAYS) {
        return false;
    }
    match event.starts_at {
        Some(starts_at) => starts_at > now,
        None => true,
    }
}
