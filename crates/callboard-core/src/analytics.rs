// Planning analytics read model
//
// Single composition point consumed by the dashboard JSON, the ICS feed, and
// the weekly digest. Computed once per request/run from one event snapshot so
// the consumers never disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::conflict::{detect_conflicts, resolve_bounds, EventConflict};
use crate::event::{Event, EventStatus};
use crate::sla::{reviewer_sla, ReviewerSlaSnapshot};

/// How many events the "upcoming" list carries
pub const UPCOMING_LIMIT: usize = 10;

/// Compact event reference for dashboard lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    pub id: Uuid,
    pub title: String,
    pub status: EventStatus,
    pub starts_at: DateTime<Utc>,
    pub venue_name: String,
}

/// Submitted event still waiting for a reviewer assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AwaitingReviewerEvent {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    pub venue_name: String,
}

/// Calendar projection of one schedulable event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventView {
    pub id: Uuid,
    pub title: String,
    pub status: EventStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub venue_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_name: Option<String>,
    pub conflict: bool,
}

/// The planning read model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlanningAnalytics {
    pub status_counts: BTreeMap<String, u64>,
    pub conflicts: Vec<EventConflict>,
    pub upcoming: Vec<UpcomingEvent>,
    pub awaiting_reviewer: Vec<AwaitingReviewerEvent>,
    pub total_events: u64,
    pub calendar_events: Vec<CalendarEventView>,
    pub reviewer_sla: Vec<ReviewerSlaSnapshot>,
}

/// Build the read model from a full event snapshot
pub fn build_analytics(events: &[Event], now: DateTime<Utc>) -> PlanningAnalytics {
    let mut status_counts: BTreeMap<String, u64> = BTreeMap::new();
    for event in events {
        *status_counts.entry(event.status.to_string()).or_insert(0) += 1;
    }

    let conflicts = detect_conflicts(events);

    let mut upcoming: Vec<UpcomingEvent> = events
        .iter()
        .filter(|e| !e.status.is_terminal())
        .filter_map(|e| {
            let starts_at = e.starts_at.filter(|s| *s >= now)?;
            Some(UpcomingEvent {
                id: e.id,
                title: e.title.clone(),
                status: e.status,
                starts_at,
                venue_name: e.venue_name.clone(),
            })
        })
        .collect();
    upcoming.sort_by_key(|e| e.starts_at);
    upcoming.truncate(UPCOMING_LIMIT);

    let awaiting_reviewer: Vec<AwaitingReviewerEvent> = events
        .iter()
        .filter(|e| e.status == EventStatus::Submitted && e.reviewer_id.is_none())
        .map(|e| AwaitingReviewerEvent {
            id: e.id,
            title: e.title.clone(),
            starts_at: e.starts_at,
            venue_name: e.venue_name.clone(),
        })
        .collect();

    let calendar_events: Vec<CalendarEventView> = events
        .iter()
        .filter_map(|e| {
            let starts_at = e.starts_at?;
            let (starts_at, ends_at) = resolve_bounds(starts_at, e.ends_at);
            Some(CalendarEventView {
                id: e.id,
                title: e.title.clone(),
                status: e.status,
                starts_at,
                ends_at,
                venue_name: e.venue_name.clone(),
                venue_space: e.venue_space.clone(),
                reviewer_name: e.reviewer_name.clone(),
                conflict: conflicts.iter().any(|c| c.involves(e.id)),
            })
        })
        .collect();

    PlanningAnalytics {
        status_counts,
        upcoming,
        awaiting_reviewer,
        total_events: events.len() as u64,
        calendar_events,
        reviewer_sla: reviewer_sla(events, now),
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn event(title: &str, status: EventStatus, starts_at: Option<&str>, venue: Uuid) -> Event {
        Event {
            id: Uuid::now_v7(),
            title: title.into(),
            status,
            description: None,
            starts_at: starts_at.map(ts),
            ends_at: None,
            venue_id: venue,
            venue_name: "The Depot".into(),
            venue_space: Some("Main Hall".into()),
            areas: vec![],
            reviewer_id: None,
            reviewer_name: None,
            created_by: Uuid::now_v7(),
            created_at: ts("2025-01-01T00:00:00Z"),
            updated_at: ts("2025-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn composes_counts_upcoming_and_awaiting() {
        let now = ts("2025-05-01T00:00:00Z");
        let venue = Uuid::now_v7();
        let events = vec![
            event("Early", EventStatus::Submitted, Some("2025-05-02T00:00:00Z"), venue),
            event("Later", EventStatus::Approved, Some("2025-06-01T00:00:00Z"), venue),
            event("Past", EventStatus::Published, Some("2025-04-01T00:00:00Z"), venue),
            event("Unscheduled", EventStatus::Draft, None, venue),
        ];
        let analytics = build_analytics(&events, now);

        assert_eq!(analytics.total_events, 4);
        assert_eq!(analytics.status_counts.get("draft"), Some(&1));
        assert_eq!(analytics.status_counts.get("submitted"), Some(&1));

        // Past and unscheduled events stay out of the upcoming list
        assert_eq!(analytics.upcoming.len(), 2);
        assert_eq!(analytics.upcoming[0].title, "Early");
        assert_eq!(analytics.upcoming[1].title, "Later");

        // Submitted with no reviewer waits for assignment
        assert_eq!(analytics.awaiting_reviewer.len(), 1);
        assert_eq!(analytics.awaiting_reviewer[0].title, "Early");

        // Unscheduled event is absent from the calendar projection
        assert_eq!(analytics.calendar_events.len(), 3);
    }

    #[test]
    fn calendar_projection_flags_conflicts() {
        let now = ts("2025-05-01T00:00:00Z");
        let venue = Uuid::now_v7();
        let events = vec![
            event("A", EventStatus::Approved, Some("2025-05-10T18:00:00Z"), venue),
            event("B", EventStatus::Approved, Some("2025-05-10T19:00:00Z"), venue),
            event("C", EventStatus::Approved, Some("2025-05-20T18:00:00Z"), venue),
        ];
        let analytics = build_analytics(&events, now);
        assert_eq!(analytics.conflicts.len(), 1);
        let flagged: Vec<bool> = analytics.calendar_events.iter().map(|e| e.conflict).collect();
        assert_eq!(flagged, vec![true, true, false]);
        // Default 2h bounds flow into the projection
        assert_eq!(
            analytics.calendar_events[0].ends_at,
            ts("2025-05-10T20:00:00Z")
        );
    }
}
