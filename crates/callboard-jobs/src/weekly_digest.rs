// Weekly planning digest
//
// Builds the analytics read model once and mails a plain-text snapshot to the
// configured planning recipients. Recipient failures are isolated: one bounced
// address never blocks the rest of the list.

use anyhow::Result;

use callboard_core::{build_analytics, Clock, PlanningAnalytics};
use callboard_storage::Database;

use crate::alerts::AlertSink;
use crate::mailer::{EmailMessage, Mailer};
use crate::summary::JobSummary;

const JOB_NAME: &str = "weekly_digest";

pub async fn run(
    db: &Database,
    mailer: &dyn Mailer,
    alerts: &dyn AlertSink,
    clock: &dyn Clock,
    recipients: &[String],
) -> Result<JobSummary> {
    let now = clock.now();

    let events = db.load_events_with_areas().await?;
    let analytics = build_analytics(&events, now);
    let body = render_digest(&analytics);

    let mut summary = JobSummary::default();
    for recipient in recipients {
        summary.processed += 1;
        let message = EmailMessage {
            to: recipient.clone(),
            to_name: "Planning team".to_string(),
            subject: format!("Planning digest - week of {}", now.format("%Y-%m-%d")),
            body: body.clone(),
        };
        match mailer.send(&message).await {
            Ok(()) => summary.dispatched += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(recipient, error = %e, "digest delivery failed");
            }
        }
    }

    if summary.has_failures() {
        alerts
            .alert(
                JOB_NAME,
                &format!(
                    "{} of {} digest sends failed",
                    summary.failed, summary.processed
                ),
                "see logs for recipient errors",
            )
            .await;
    }

    tracing::info!(?summary, "weekly digest run complete");
    Ok(summary)
}

/// Render the read model as a plain-text digest
pub fn render_digest(analytics: &PlanningAnalytics) -> String {
    let mut out = String::new();

    out.push_str(&format!("Events in the pipeline: {}\n", analytics.total_events));
    for (status, count) in &analytics.status_counts {
        out.push_str(&format!("  {status}: {count}\n"));
    }

    out.push_str(&format!("\nScheduling conflicts: {}\n", analytics.conflicts.len()));
    for conflict in &analytics.conflicts {
        out.push_str(&format!(
            "  {} - \"{}\" overlaps \"{}\"\n",
            conflict.bucket, conflict.first_title, conflict.second_title
        ));
    }

    out.push_str(&format!(
        "\nAwaiting reviewer assignment: {}\n",
        analytics.awaiting_reviewer.len()
    ));

    let pressured: Vec<_> = analytics
        .reviewer_sla
        .iter()
        .filter(|s| s.overdue > 0 || s.warning > 0)
        .collect();
    if !pressured.is_empty() {
        out.push_str("\nReviewers behind SLA:\n");
        for snapshot in pressured {
            out.push_str(&format!(
                "  {}: {} overdue, {} in warning ({} assigned)\n",
                snapshot.reviewer_name, snapshot.overdue, snapshot.warning, snapshot.total
            ));
        }
    }

    if !analytics.upcoming.is_empty() {
        out.push_str("\nNext up:\n");
        for event in &analytics.upcoming {
            out.push_str(&format!(
                "  {} - \"{}\" at {} ({})\n",
                event.starts_at.format("%Y-%m-%d %H:%M"),
                event.title,
                event.venue_name,
                event.status
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::{Event, EventStatus};
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn digest_covers_counts_conflicts_and_sla() {
        let now = ts("2025-05-01T00:00:00Z");
        let venue = Uuid::now_v7();
        let reviewer = Uuid::now_v7();
        let base = Event {
            id: Uuid::now_v7(),
            title: "Jazz Night".into(),
            status: EventStatus::Submitted,
            description: None,
            starts_at: Some(ts("2025-05-02T19:00:00Z")),
            ends_at: Some(ts("2025-05-02T21:00:00Z")),
            venue_id: venue,
            venue_name: "The Depot".into(),
            venue_space: Some("Main Hall".into()),
            areas: vec![],
            reviewer_id: Some(reviewer),
            reviewer_name: Some("Alice".into()),
            created_by: Uuid::now_v7(),
            created_at: ts("2025-01-01T00:00:00Z"),
            updated_at: ts("2025-01-01T00:00:00Z"),
        };
        let clashing = Event {
            id: Uuid::now_v7(),
            title: "Poetry Slam".into(),
            starts_at: Some(ts("2025-05-02T20:00:00Z")),
            ends_at: Some(ts("2025-05-02T22:00:00Z")),
            reviewer_id: None,
            reviewer_name: None,
            ..base.clone()
        };

        let analytics = build_analytics(&[base, clashing], now);
        let digest = render_digest(&analytics);

        assert!(digest.contains("Events in the pipeline: 2"));
        assert!(digest.contains("submitted: 2"));
        assert!(digest.contains("Scheduling conflicts: 1"));
        assert!(digest.contains("\"Jazz Night\" overlaps \"Poetry Slam\""));
        assert!(digest.contains("Awaiting reviewer assignment: 1"));
        assert!(digest.contains("Alice: 0 overdue, 1 in warning (1 assigned)"));
        assert!(digest.contains("Next up:"));
    }
}
