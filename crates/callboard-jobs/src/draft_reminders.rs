// Draft reminder job
//
// Scans for drafts that have sat untouched past the reminder window and nudges
// their owners. Safe to re-run: a reminder already sent within the dedup
// window is skipped, a recent attempt backs off, and a stale failure retries
// onto the same notification row.

use anyhow::Result;
use chrono::Duration;

use callboard_core::reminders::{draft_reminder_due, DEDUP_WINDOW_HOURS};
use callboard_core::{
    evaluate_dedup, Clock, DedupDecision, Event, NotificationKind, NotificationPayload, SendMeta,
};
use callboard_storage::{CreateNotification, Database};

use crate::alerts::AlertSink;
use crate::delivery::{existing_from_row, mark_failed, mark_sent, Outcome};
use crate::mailer::{EmailMessage, Mailer};
use crate::summary::JobSummary;

const JOB_NAME: &str = "draft_reminders";

pub async fn run(
    db: &Database,
    mailer: &dyn Mailer,
    alerts: &dyn AlertSink,
    clock: &dyn Clock,
) -> Result<JobSummary> {
    let now = clock.now();

    // The initial query is the only hard failure of a run
    let events = db.load_events_with_areas().await?;

    let due: Vec<&Event> = events
        .iter()
        .filter(|e| draft_reminder_due(e, now))
        .collect();

    let mut summary = JobSummary::default();
    for event in due {
        summary.processed += 1;
        match process_one(db, mailer, clock, event).await {
            Ok(Outcome::Dispatched) => summary.dispatched += 1,
            Ok(Outcome::Queued) => summary.queued += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Ok(Outcome::Failed) => summary.failed += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(event_id = %event.id, error = %e, "draft reminder item failed");
            }
        }
    }

    if summary.has_failures() {
        alerts
            .alert(
                JOB_NAME,
                &format!("{} of {} reminders failed", summary.failed, summary.processed),
                "see logs for per-event errors",
            )
            .await;
    }

    tracing::info!(?summary, "draft reminder run complete");
    Ok(summary)
}

async fn process_one(
    db: &Database,
    mailer: &dyn Mailer,
    clock: &dyn Clock,
    event: &Event,
) -> Result<Outcome> {
    let now = clock.now();
    let kind = NotificationKind::DraftReminder.to_string();
    let since = now - Duration::hours(DEDUP_WINDOW_HOURS);

    let existing = db
        .find_recent_notification(&kind, event.created_by, event.id, since)
        .await?;
    let prior = existing.as_ref().map(existing_from_row).transpose()?;

    let (notification_id, prior_meta, freshly_queued) =
        match evaluate_dedup(prior.as_ref(), now) {
            DedupDecision::Skip(reason) => {
                tracing::debug!(event_id = %event.id, ?reason, "draft reminder skipped");
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
                    event_id: event.id,
                    send_meta: SendMeta::default(),
                };
                let row = db
                    .insert_notification(CreateNotification {
                        kind: kind.clone(),
                        target_user: event.created_by,
                        payload: serde_json::to_value(&payload)?,
                        due_at: now,
                    })
                    .await?;
                (row.id, SendMeta::default(), true)
            }
        };

    let message = reminder_email(event);
    match mailer.send(&message).await {
        Ok(()) => {
            mark_sent(db, notification_id, event.id, &prior_meta, now).await?;
            Ok(Outcome::Dispatched)
        }
        Err(e) => {
            tracing::warn!(event_id = %event.id, error = %e, "draft reminder delivery failed");
            mark_failed(db, notification_id, event.id, &prior_meta, now, &e.to_string(), None)
                .await?;
            // A brand-new row counts as queued: it is recorded and a later
            // run will retry it once the backoff window passes
            if freshly_queued {
                Ok(Outcome::Queued)
            } else {
                Ok(Outcome::Failed)
            }
        }
    }
}

fn reminder_email(event: &Event) -> EmailMessage {
    EmailMessage {
        to: event.created_by.to_string(),
        to_name: "Event owner".to_string(),
        subject: format!("Reminder: \"{}\" is still a draft", event.title),
        body: format!(
            "Your event \"{}\" at {} has not been submitted for review yet.\n\
             Submit it when it is ready, or cancel it if the plans changed.",
            event.title, event.venue_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::EventStatus;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn reminder_email_names_the_event_and_venue() {
        let event = Event {
            id: Uuid::now_v7(),
            title: "Open Mic".into(),
            status: EventStatus::Draft,
            description: None,
            starts_at: None,
            ends_at: None,
            venue_id: Uuid::now_v7(),
            venue_name: "The Depot".into(),
            venue_space: None,
            areas: vec![],
            reviewer_id: None,
            reviewer_name: None,
            created_by: Uuid::now_v7(),
            created_at: ts("2025-05-01T00:00:00Z"),
            updated_at: ts("2025-05-01T00:00:00Z"),
        };
        let message = reminder_email(&event);
        assert_eq!(message.to, event.created_by.to_string());
        assert!(message.subject.contains("Open Mic"));
        assert!(message.body.contains("The Depot"));
    }
}
