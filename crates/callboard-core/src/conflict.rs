// Venue-space conflict detection
//
// Events are grouped into buckets (one per exclusive resource), then each
// bucket is swept: sort by start, scan forward while the next start is within
// the current window, break early once it is not. Closed-interval overlap, so
// touching endpoints conflict. O(n log n + k) per bucket.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::event::Event;
use crate::resource::bucket_keys;

/// Default duration assumed when an event has no end time
pub const DEFAULT_DURATION_MS: i64 = 2 * 60 * 60 * 1000;

/// Default duration as a chrono duration
pub fn default_duration() -> Duration {
    Duration::milliseconds(DEFAULT_DURATION_MS)
}

/// Resolve an event's time window.
///
/// A missing end, or an end before the start, falls back to start + 2h.
pub fn resolve_bounds(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match ends_at {
        Some(end) if end >= starts_at => (starts_at, end),
        _ => (starts_at, starts_at + default_duration()),
    }
}

/// Two events sharing a bucket with overlapping time windows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventConflict {
    /// Human label of the shared resource
    pub bucket: String,
    pub first_id: Uuid,
    pub first_title: String,
    pub second_id: Uuid,
    pub second_title: String,
    pub overlap_start: DateTime<Utc>,
    pub overlap_end: DateTime<Utc>,
}

impl EventConflict {
    /// True when the given event participates in this conflict
    pub fn involves(&self, event_id: Uuid) -> bool {
        self.first_id == event_id || self.second_id == event_id
    }
}

struct Entry {
    start: i64,
    end: i64,
    idx: usize,
}

/// Find all conflicting pairs across the given events.
///
/// Events without a start time are excluded entirely. An event reserving
/// multiple areas can appear in multiple pairs, one per shared bucket.
pub fn detect_conflicts(events: &[Event]) -> Vec<EventConflict> {
    let mut buckets: HashMap<String, (String, Vec<Entry>)> = HashMap::new();

    for (idx, event) in events.iter().enumerate() {
        let Some(starts_at) = event.starts_at else {
            continue;
        };
        let (start, end) = resolve_bounds(starts_at, event.ends_at);
        let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
        for bucket in bucket_keys(event.venue_id, &event.reserved_resource()) {
            buckets
                .entry(bucket.key)
                .or_insert_with(|| (bucket.label, Vec::new()))
                .1
                .push(Entry { start, end, idx });
        }
    }

    let mut conflicts = Vec::new();
    for (_, (label, mut entries)) in buckets {
        entries.sort_by_key(|e| e.start);
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                // Sorted by start: once this start clears our end, no later
                // entry can overlap entry i either
                if entries[j].start > entries[i].end {
                    break;
                }
                let (a, b) = (&entries[i], &entries[j]);
                if a.start <= b.end && b.start <= a.end {
                    let first = &events[a.idx];
                    let second = &events[b.idx];
                    conflicts.push(EventConflict {
                        bucket: label.clone(),
                        first_id: first.id,
                        first_title: first.title.clone(),
                        second_id: second.id,
                        second_title: second.title.clone(),
                        overlap_start: millis_to_utc(a.start.max(b.start)),
                        overlap_end: millis_to_utc(a.end.min(b.end)),
                    });
                }
            }
        }
    }

    // HashMap iteration order is arbitrary; pin a stable output order
    conflicts.sort_by(|x, y| {
        x.overlap_start
            .cmp(&y.overlap_start)
            .then_with(|| x.bucket.cmp(&y.bucket))
            .then_with(|| x.first_id.cmp(&y.first_id))
    });
    conflicts
}

fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
