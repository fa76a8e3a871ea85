// Reviewer SLA classification
//
// Only submitted events with an assigned reviewer and a start time count.
// diff_days = ceil((start - now) / 1 day); >= 3 on-track, 0..3 warning,
// negative overdue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::event::{Event, EventStatus};

const DAY_MS: i64 = 86_400_000;

/// SLA bucket for a single submitted, reviewer-assigned event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SlaBucket {
    OnTrack,
    Warning,
    Overdue,
}

/// Whole days until start, rounded up
pub fn diff_days(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = starts_at.timestamp_millis() - now.timestamp_millis();
    let days = delta.div_euclid(DAY_MS);
    if delta.rem_euclid(DAY_MS) > 0 {
        days + 1
    } else {
        days
    }
}

/// Classify a days-until-start figure
pub fn classify_days_until_start(days: i64) -> SlaBucket {
    if days >= 3 {
        SlaBucket::OnTrack
    } else if days >= 0 {
        SlaBucket::Warning
    } else {
        SlaBucket::Overdue
    }
}

/// Per-reviewer aggregate over currently submitted, assigned events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReviewerSlaSnapshot {
    pub reviewer_id: Uuid,
    pub reviewer_name: String,
    pub on_track: u32,
    pub warning: u32,
    pub overdue: u32,
    pub total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due_at: Option<DateTime<Utc>>,
}

/// Aggregate SLA state per reviewer.
///
/// Output is sorted most-pressured first: overdue desc, then warning desc,
/// then next_due_at ascending.
pub fn reviewer_sla(events: &[Event], now: DateTime<Utc>) -> Vec<ReviewerSlaSnapshot> {
    let mut per_reviewer: Vec<ReviewerSlaSnapshot> = Vec::new();

    for event in events {
        if event.status != EventStatus::Submitted {
            continue;
        }
        let Some(reviewer_id) = event.reviewer_id else {
            continue;
        };
        let Some(starts_at) = event.starts_at else {
            continue;
        };

        let idx = per_reviewer
            .iter()
            .position(|s| s.reviewer_id == reviewer_id)
            .unwrap_or_else(|| {
                per_reviewer.push(ReviewerSlaSnapshot {
                    reviewer_id,
                    reviewer_name: event
                        .reviewer_name
                        .clone()
                        .unwrap_or_else(|| reviewer_id.to_string()),
                    on_track: 0,
                    warning: 0,
                    overdue: 0,
                    total: 0,
                    next_due_at: None,
                });
                per_reviewer.len() - 1
            });
        let snapshot = &mut per_reviewer[idx];

        match classify_days_until_start(diff_days(starts_at, now)) {
            SlaBucket::OnTrack => snapshot.on_track += 1,
            SlaBucket::Warning => snapshot.warning += 1,
            SlaBucket::Overdue => snapshot.overdue += 1,
        }
        snapshot.total += 1;
        // Strict < retains the first-seen minimum on ties
        if snapshot.next_due_at.is_none_or(|due| starts_at < due) {
            snapshot.next_due_at = Some(starts_at);
        }
    }

    per_reviewer.sort_by(|a, b| {
        b.overdue
            .cmp(&a.overdue)
            .then_with(|| b.warning.cmp(&a.warning))
            .then_with(|| a.next_due_at.cmp(&b.next_due_at))
    });
    per_reviewer
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
    fn boundary_classification() {
        let now = ts("2025-05-01T00:00:00Z");
        // Exactly 3 days out: on-track
        assert_eq!(
            classify_days_until_start(diff_days(ts("2025-05-04T00:00:00Z"), now)),
            SlaBucket::OnTrack
        );
        // One day out (spec example): warning
        assert_eq!(diff_days(ts("2025-05-02T00:00:00Z"), now), 1);
        assert_eq!(
            classify_days_until_start(diff_days(ts("2025-05-02T00:00:00Z"), now)),
            SlaBucket::Warning
        );
        // Starting right now: warning
        assert_eq!(
            classify_days_until_start(diff_days(now, now)),
            SlaBucket::Warning
        );
        // Two days past (spec example): overdue
        assert_eq!(diff_days(ts("2025-04-29T00:00:00Z"), now), -2);
        assert_eq!(
            classify_days_until_start(diff_days(ts("2025-04-29T00:00:00Z"), now)),
            SlaBucket::Overdue
        );
    }

    #[test]
    fn diff_days_rounds_up() {
        let now = ts("2025-05-01T00:00:00Z");
        assert_eq!(diff_days(ts("2025-05-01T00:00:01Z"), now), 1);
        assert_eq!(diff_days(ts("2025-05-03T23:59:59Z"), now), 3);
        assert_eq!(diff_days(ts("2025-05-04T00:00:00Z"), now), 3);
    }

    #[test]
    fn aggregates_per_reviewer() {
        let now = ts("2025-05-01T00:00:00Z");
        let alice = (Uuid::now_v7(), "Alice");
        let bob = (Uuid::now_v7(), "Bob");
        let events = vec![
            submitted(Some(alice), Some("2025-05-10T00:00:00Z")), // on-track
            submitted(Some(alice), Some("2025-04-20T00:00:00Z")), // overdue
            submitted(Some(bob), Some("2025-05-02T00:00:00Z")),   // warning
        ];
        let snapshots = reviewer_sla(&events, now);
        assert_eq!(snapshots.len(), 2);
        // Alice has the overdue event, so she sorts first
        assert_eq!(snapshots[0].reviewer_name, "Alice");
        assert_eq!(snapshots[0].overdue, 1);
        assert_eq!(snapshots[0].on_track, 1);
        assert_eq!(snapshots[0].total, 2);
        assert_eq!(snapshots[0].next_due_at, Some(ts("2025-04-20T00:00:00Z")));
        assert_eq!(snapshots[1].reviewer_name, "Bob");
        assert_eq!(snapshots[1].warning, 1);
    }

    #[test]
    fn skips_unassigned_unstarted_and_non_submitted() {
        let now = ts("2025-05-01T00:00:00Z");
        let reviewer = (Uuid::now_v7(), "Alice");
        let mut approved = submitted(Some(reviewer), Some("2025-05-10T00:00:00Z"));
        approved.status = EventStatus::Approved;
        let events = vec![
            submitted(None, Some("2025-05-10T00:00:00Z")),
            submitted(Some(reviewer), None),
            approved,
        ];
        assert!(reviewer_sla(&events, now).is_empty());
    }
}
