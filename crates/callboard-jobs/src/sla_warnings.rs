// Reviewer SLA warning job
//
// For every submitted, reviewer-assigned event inside the warning or overdue
// window, nudge the reviewer. Re-invocation is safe: a warning sent within
// the last 24 hours is skipped, an attempt under an hour old backs off, and
// anything else upserts onto the existing notification row rather than
// inserting a duplicate.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use callboard_core::reminders::DEDUP_WINDOW_HOURS;
use callboard_core::{
    classify_days_until_start, diff_days, evaluate_dedup, Clock, DedupDecision, Event,
    EventStatus, NotificationKind, NotificationPayload, SendMeta, SlaBucket,
};
use callboard_storage::{CreateNotification, Database};

use crate::alerts::AlertSink;
use crate::delivery::{existing_from_row, mark_failed, mark_sent, Outcome};
use crate::mailer::{EmailMessage, Mailer};
use crate::summary::JobSummary;

const JOB_NAME: &str = "sla_warnings";

/// One (reviewer, event) pair needing a warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaTarget {
    pub reviewer_id: Uuid,
    pub reviewer_name: String,
    pub event_id: Uuid,
    pub event_title: String,
    pub starts_at: DateTime<Utc>,
    pub bucket: SlaBucket,
    pub days_until_start: i64,
}

/// Pure severity scan: submitted + assigned + scheduled, in warning or overdue
pub fn warning_targets(events: &[Event], now: DateTime<Utc>) -> Vec<SlaTarget> {
    let mut targets = Vec::new();
    for event in events {
        if event.status != EventStatus::Submitted {
            continue;
        }
        let (Some(reviewer_id), Some(starts_at)) = (event.reviewer_id, event.starts_at) else {
            continue;
        };
        let days = diff_days(starts_at, now);
        let bucket = classify_days_until_start(days);
        if bucket == SlaBucket::OnTrack {
            continue;
        }
        targets.push(SlaTarget {
            reviewer_id,
            reviewer_name: event
                .reviewer_name
                .clone()
                .unwrap_or_else(|| reviewer_id.to_string()),
            event_id: event.id,
            event_title: event.title.clone(),
            starts_at,
            bucket,
            days_until_start: days,
        });
    }
    targets
}

pub async fn run(
    db: &Database,
    mailer: &dyn Mailer,
    alerts: &dyn AlertSink,
    clock: &dyn Clock,
) -> Result<JobSummary> {
    let now = clock.now();

    let events = db.load_events_with_areas().await?;
    let targets = warning_targets(&events, now);

    let mut summary = JobSummary::default();
    for target in &targets {
        summary.processed += 1;
        match process_one(db, mailer, clock, target).await {
            Ok(Outcome::Dispatched) => summary.dispatched += 1,
            Ok(Outcome::Queued) => summary.queued += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Ok(Outcome::Failed) => summary.failed += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(
                    event_id = %target.event_id,
                    reviewer_id = %target.reviewer_id,
                    error = %e,
                    "sla warning item failed"
                );
            }
        }
    }

    if summary.has_failures() {
        alerts
            .alert(
                JOB_NAME,
                &format!("{} of {} warnings failed", summary.failed, summary.processed),
                "see logs for per-event errors",
            )
            .await;
    }

    tracing::info!(?summary, "sla warning run complete");
    Ok(summary)
}

async fn process_one(
    db: &Database,
    mailer: &dyn Mailer,
    clock: &dyn Clock,
    target: &SlaTarget,
) -> Result<Outcome> {
    let now = clock.now();
    let kind = NotificationKind::SlaWarning.to_string();
    let since = now - Duration::hours(DEDUP_WINDOW_HOURS);

    let existing = db
        .find_recent_notification(&kind, target.reviewer_id, target.event_id, since)
        .await?;
    let prior = existing.as_ref().map(existing_from_row).transpose()?;

    let (notification_id, prior_meta, freshly_queued) =
        match evaluate_dedup(prior.as_ref(), now) {
            DedupDecision::Skip(reason) => {
                tracing::debug!(
                    event_id = %target.event_id,
                    reviewer_id = %target.reviewer_id,
                    ?reason,
                    "sla warning skipped"
                );
                return Ok(Outcome::Skipped);
            }
            DedupDecision::RetryExisting(id) => {
                let meta = existing
                    .as_ref()
                    .and_then(|row| row.parsed_payload().ok())
                    .map(|p| p.send_meta)
                    .unwrap_or_default();
                (id, meta, false)
            }
            DedupDecision::SendNew => {
                let payload = NotificationPayload {
                    event_id: target.event_id,
                    send_meta: SendMeta::default(),
                };
                let row = db
                    .insert_notification(CreateNotification {
                        kind: kind.clone(),
                        target_user: target.reviewer_id,
                        payload: serde_json::to_value(&payload)?,
                        due_at: now,
                    })
                    .await?;
                (row.id, SendMeta::default(), true)
            }
        };

    let message = warning_email(target);
    match mailer.send(&message).await {
        Ok(()) => {
            mark_sent(db, notification_id, target.event_id, &prior_meta, now).await?;
            Ok(Outcome::Dispatched)
        }
        Err(e) => {
            tracing::warn!(
                event_id = %target.event_id,
                reviewer_id = %target.reviewer_id,
                error = %e,
                "sla warning delivery failed"
            );
            mark_failed(
                db,
                notification_id,
                target.event_id,
                &prior_meta,
                now,
                &e.to_string(),
                None,
            )
            .await?;
            if freshly_queued {
                Ok(Outcome::Queued)
            } else {
                Ok(Outcome::Failed)
            }
        }
    }
}

fn warning_email(target: &SlaTarget) -> EmailMessage {
    let urgency = match target.bucket {
        SlaBucket::Overdue => "is overdue for review".to_string(),
        _ => format!("starts in {} day(s)", target.days_until_start.max(0)),
    };
    EmailMessage {
        to: target.reviewer_id.to_string(),
        to_name: target.reviewer_name.clone(),
        subject: format!("Review needed: \"{}\" {}", target.event_title, urgency),
        body: format!(
            "The event \"{}\" starting {} is assigned to you and {}.\n\
             Please approve it or request revisions.",
            target.event_title,
            target.starts_at.format("%Y-%m-%d %H:%M UTC"),
            urgency
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn submitted(reviewer: Option<(Uuid, &str)>, starts_at: Option<&str>) -> Event {
        Event {
            id: Uuid::now_v7(),
            title: "Show".into(),
            status: EventStatus::Submitted,
            description: None,
            starts_at: starts_at.map(ts),
            ends_at: None,
            venue_id: Uuid::now_v7(),
            venue_name: "The Depot".into(),
            venue_space: None,
            areas: vec![],
            reviewer_id: reviewer.map(|(id, _)| id),
            reviewer_name: reviewer.map(|(_, name)| name.to_string()),
            created_by: Uuid::now_v7(),
            created_at: ts("2025-01-01T00:00:00Z"),
            updated_at: ts("2025-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn only_warning_and_overdue_events_become_targets() {
        let now = ts("2025-05-01T00:00:00Z");
        let alice = (Uuid::now_v7(), "Alice");
        let events = vec![
            submitted(Some(alice), Some("2025-05-10T00:00:00Z")), // on-track
            submitted(Some(alice), Some("2025-05-02T00:00:00Z")), // warning
            submitted(Some(alice), Some("2025-04-20T00:00:00Z")), // overdue
            submitted(None, Some("2025-05-02T00:00:00Z")),        // unassigned
            submitted(Some(alice), None),                         // unscheduled
        ];
        let targets = warning_targets(&events, now);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].bucket, SlaBucket::Warning);
        assert_eq!(targets[0].days_until_start, 1);
        assert_eq!(targets[1].bucket, SlaBucket::Overdue);
    }

    #[test]
    fn warning_email_reads_naturally() {
        let target = SlaTarget {
            reviewer_id: Uuid::now_v7(),
            reviewer_name: "Alice".into(),
            event_id: Uuid::now_v7(),
            event_title: "Open Mic".into(),
            starts_at: ts("2025-05-02T19:00:00Z"),
            bucket: SlaBucket::Warning,
            days_until_start: 1,
        };
        let message = warning_email(&target);
        assert!(message.subject.contains("starts in 1 day(s)"));

        let overdue = SlaTarget {
            bucket: SlaBucket::Overdue,
            days_until_start: -2,
            ..target
        };
        let message = warning_email(&overdue);
        assert!(message.subject.contains("overdue"));
    }
}
